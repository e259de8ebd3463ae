//! Error types for the factory system
//!
//! Recoverable failures are returned as [`FactoryError`]. Batch and
//! relationship operations wrap it in [`PartialFailure`] so the values
//! persisted before the failing step are not lost.

use std::fmt;

/// Result type alias for factory operations
pub type FactoryResult<T> = Result<T, FactoryError>;

#[derive(thiserror::Error, Debug)]
pub enum FactoryError {
    /// A before/after create hook rejected the item
    #[error("Hook error: {0}")]
    Hook(String),

    /// The persist function failed to store the item
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The item could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `try_state` was asked for a state that was never defined
    #[error("Unknown factory state '{0}'")]
    UnknownState(String),

    /// A hook or persist function observed a cancelled context
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FactoryError {
    pub fn hook(message: impl Into<String>) -> Self {
        FactoryError::Hook(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        FactoryError::Persistence(message.into())
    }
}

/// An error together with everything produced before it happened.
///
/// Nothing is rolled back: `partial` holds values that were already handed
/// to the persist function successfully.
pub struct PartialFailure<P> {
    pub error: FactoryError,
    pub partial: P,
}

impl<P> PartialFailure<P> {
    pub fn new(error: FactoryError, partial: P) -> Self {
        Self { error, partial }
    }

    pub fn into_parts(self) -> (FactoryError, P) {
        (self.error, self.partial)
    }
}

impl<P> fmt::Debug for PartialFailure<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<P> fmt::Display for PartialFailure<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<P> std::error::Error for PartialFailure<P> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Partial result of a has-many run
#[derive(Debug)]
pub struct HasManyPartial<P, C> {
    pub parent: Option<P>,
    pub children: Vec<C>,
}

/// Partial result of a many-to-many run
#[derive(Debug)]
pub struct HasAttachedPartial<P, R, V> {
    pub parent: Option<P>,
    pub related: Vec<R>,
    pub pivots: Vec<V>,
}
