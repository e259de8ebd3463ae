//! # elif-factory - Test Data Factories
//!
//! Composable, type-safe builders for test data. A factory wraps a base
//! constructor and layers defaults, traits, named states, sequences and
//! per-call overrides on top of it, with optional persistence through a
//! user-supplied async function.
//!
//! ## Features
//!
//! - **Layered construction**: defaults, raw defaults, traits, sequences, overrides
//! - **Named states**: `factory.state("admin")`
//! - **Persistence**: `create*` with before/after hooks and partial results on failure
//! - **Relationships**: belongs-to, has-many and many-to-many with pivot records
//! - **Fake data**: seeded, reproducible values via [`Faker`]
//!
//! ## Quick Start
//!
//! ```rust
//! use elif_factory::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct User {
//!     name: String,
//!     role: String,
//! }
//!
//! let users = Factory::new(|seq| User {
//!     name: format!("User {}", seq),
//!     role: "member".to_string(),
//! })
//! .define_state("admin", |u| u.role = "admin".to_string());
//!
//! let admin = users.state("admin").make();
//! assert_eq!(admin.name, "User 1");
//! assert_eq!(admin.role, "admin");
//!
//! let batch = users.count(3).make();
//! assert_eq!(batch[2].name, "User 3");
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod factory;

// Re-export commonly used types
pub use config::FactoryConfig;
pub use context::Context;
pub use error::{FactoryError, FactoryResult, HasAttachedPartial, HasManyPartial, PartialFailure};
pub use factory::{
    mutator, Association, Counted, Factory, Faker, HasAttached, HasMany, Mutator, StateRegistry,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        config::FactoryConfig,
        context::Context,
        error::{FactoryError, FactoryResult, PartialFailure},
        factory::{mutator, Counted, Factory, Faker, HasAttached, HasMany, Mutator},
    };
}
