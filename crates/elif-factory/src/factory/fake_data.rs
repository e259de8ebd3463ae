//! Deterministic fake data for factory constructors

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    "Kate", "Liam", "Mia", "Noah", "Olivia", "Peter", "Quinn", "Ruby", "Sam", "Tina",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Brown", "Davis", "Evans", "Fisher", "Garcia", "Harris", "Johnson", "King", "Lopez",
    "Miller", "Nelson", "Parker", "Roberts", "Smith", "Taylor", "Valdez", "Williams", "Young", "Zhang",
];

const DOMAINS: &[&str] = &["example.com", "test.org", "demo.net", "sample.io", "fake.dev"];

const COMPANY_PREFIXES: &[&str] = &["Acme", "Global", "United", "Premium", "Dynamic", "Smart"];
const COMPANY_SUFFIXES: &[&str] = &["Corp", "Inc", "LLC", "Solutions", "Systems", "Group"];

const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Franklin", "Georgetown", "Fairview", "Madison", "Arlington", "Salem",
];

const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Elm Dr", "Park Blvd", "Cedar Ln", "Maple Way", "Pine St", "River Rd",
];

const SUBJECTS: &[&str] = &["The user", "The system", "The service", "The team", "The report"];
const VERBS: &[&str] = &["creates", "updates", "reviews", "archives", "shares", "tracks"];
const OBJECTS: &[&str] = &["the order", "an invoice", "the draft", "a ticket", "the account"];

/// 2024-01-01T00:00:00Z; fake datetimes are offsets back from this instant
const EPOCH_SECS: i64 = 1_704_067_200;

/// Seeded fake data generator.
///
/// Two fakers built from the same seed yield the same values in the same
/// order.
pub struct Faker {
    rng: StdRng,
}

impl Faker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Faker for one item: mixes the sequence number into the seed
    pub fn for_sequence(seed: u64, seq: i64) -> Self {
        Self::new(seed ^ (seq as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Random number in `min..=max`
    pub fn number(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// `true` with the given probability, clamped to `0.0..=1.0`
    pub fn boolean(&mut self, probability: f64) -> bool {
        let p = if probability.is_nan() {
            0.5
        } else {
            probability.clamp(0.0, 1.0)
        };
        self.rng.gen_bool(p)
    }

    /// Pick one entry; `None` for an empty slice
    pub fn pick<'a, V>(&mut self, choices: &'a [V]) -> Option<&'a V> {
        choices.choose(&mut self.rng)
    }

    fn word(&mut self, choices: &[&'static str]) -> &'static str {
        self.pick(choices).copied().unwrap_or_default()
    }

    pub fn first_name(&mut self) -> String {
        self.word(FIRST_NAMES).to_string()
    }

    pub fn last_name(&mut self) -> String {
        self.word(LAST_NAMES).to_string()
    }

    pub fn name(&mut self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    pub fn username(&mut self) -> String {
        let first = self.word(FIRST_NAMES).to_lowercase();
        format!("{}{}", first, self.number(1, 999))
    }

    pub fn email(&mut self) -> String {
        let user = self.username();
        format!("{}@{}", user, self.word(DOMAINS))
    }

    /// US style phone number: `(555) 555-5555`
    pub fn phone(&mut self) -> String {
        format!(
            "({}) {}-{:04}",
            self.number(200, 999),
            self.number(200, 999),
            self.number(0, 9999)
        )
    }

    pub fn company(&mut self) -> String {
        format!("{} {}", self.word(COMPANY_PREFIXES), self.word(COMPANY_SUFFIXES))
    }

    pub fn city(&mut self) -> String {
        self.word(CITIES).to_string()
    }

    pub fn address(&mut self) -> String {
        format!("{} {}", self.number(1, 9999), self.word(STREETS))
    }

    pub fn sentence(&mut self) -> String {
        format!(
            "{} {} {}.",
            self.word(SUBJECTS),
            self.word(VERBS),
            self.word(OBJECTS)
        )
    }

    pub fn paragraph(&mut self) -> String {
        let count = self.number(3, 6);
        (0..count)
            .map(|_| self.sentence())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Random version 4 UUID drawn from this faker's stream
    pub fn uuid(&mut self) -> uuid::Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    /// Datetime within the year before 2024-01-01
    pub fn datetime(&mut self) -> DateTime<Utc> {
        let epoch = Utc.timestamp_opt(EPOCH_SECS, 0).single().unwrap_or_default();
        epoch - Duration::seconds(self.number(0, 365 * 24 * 60 * 60))
    }
}

impl std::fmt::Debug for Faker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Faker").finish_non_exhaustive()
    }
}
