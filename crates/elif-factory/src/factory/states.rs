//! Named states: reusable mutators addressable by name

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::Mutator;
use crate::error::{FactoryError, FactoryResult};

/// Registry of named states for one factory.
///
/// States are only looked up here; applying one appends its mutator to a
/// derived factory's global traits.
pub struct StateRegistry<T> {
    states: HashMap<String, Mutator<T>>,
}

impl<T> StateRegistry<T> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Insert a state, overwriting any state with the same name
    pub fn define(&mut self, name: impl Into<String>, state: Mutator<T>) {
        self.states.insert(name.into(), state);
    }

    pub fn get(&self, name: &str) -> Option<&Mutator<T>> {
        self.states.get(name)
    }

    /// Look up a state, reporting unknown names as [`FactoryError::UnknownState`]
    pub fn resolve(&self, name: &str) -> FactoryResult<Mutator<T>> {
        self.states
            .get(name)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownState(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Defined state names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.states.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<T> Clone for StateRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            states: self
                .states
                .iter()
                .map(|(name, state)| (name.clone(), Arc::clone(state)))
                .collect(),
        }
    }
}

impl<T> Default for StateRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
