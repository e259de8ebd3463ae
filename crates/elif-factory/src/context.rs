//! Context passed to persist functions and create hooks

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-owned context threaded through `create` calls.
///
/// The factory never inspects it. Persist functions and hooks use it to
/// reach shared resources (a connection pool, a recorder) and to honour
/// cancellation.
#[derive(Clone, Default)]
pub struct Context {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value of the same type
    pub fn with_value<V: Any + Send + Sync>(mut self, value: V) -> Self {
        self.values.insert(TypeId::of::<V>(), Arc::new(value));
        self
    }

    /// Get a value stored with [`Context::with_value`]
    pub fn get<V: Any + Send + Sync>(&self) -> Option<&V> {
        self.values
            .get(&TypeId::of::<V>())
            .and_then(|value| value.downcast_ref::<V>())
    }

    /// Signal cancellation to every clone of this context
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TenantId(u32);

    #[test]
    fn test_typed_values() {
        let ctx = Context::new().with_value(TenantId(7)).with_value("primary");

        assert_eq!(ctx.get::<TenantId>(), Some(&TenantId(7)));
        assert_eq!(ctx.get::<&str>(), Some(&"primary"));
        assert!(ctx.get::<String>().is_none());
    }

    #[test]
    fn test_with_value_replaces_same_type() {
        let ctx = Context::new().with_value(TenantId(1)).with_value(TenantId(2));
        assert_eq!(ctx.get::<TenantId>(), Some(&TenantId(2)));
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());

        ctx.cancel();
        assert!(clone.is_cancelled());
    }
}
