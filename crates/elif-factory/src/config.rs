//! Factory configuration

/// Environment variable holding the base seed for fake data
pub const SEED_ENV_VAR: &str = "ELIF_FACTORY_SEED";

/// Configuration for factory behavior
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactoryConfig {
    /// Label used in tracing events; defaults to the model type name
    pub name: Option<String>,
    /// Base seed for [`Faker`](crate::factory::fake_data::Faker) generation
    pub seed: u64,
}

impl FactoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `ELIF_FACTORY_SEED`.
    ///
    /// A missing or unparsable value leaves the seed at 0.
    pub fn from_env() -> Self {
        let seed = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Self { name: None, seed }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
