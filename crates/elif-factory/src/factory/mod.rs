//! Model Factory System
//!
//! A [`Factory`] turns a base constructor `Fn(seq) -> T` into a configurable
//! test data builder. Every produced item goes through the same layers, in
//! this order:
//!
//! 1. the constructor, called with the next sequence number (starting at 1)
//! 2. defaults
//! 3. raw defaults (only for `raw*` calls)
//! 4. global traits, including applied states and `when`/`unless` traits
//! 5. the sequence entry for this item, cycling `(seq - 1) % len`
//! 6. per-call overrides
//!
//! The tap observer then sees the finished item. `create*` calls also run
//! before hooks, the persist function and after hooks.

use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::config::FactoryConfig;
use crate::context::Context;
use crate::error::{FactoryResult, PartialFailure};

pub mod counted;
pub mod fake_data;
pub mod relationships;
pub mod states;
pub mod traits;

pub use counted::Counted;
pub use fake_data::Faker;
pub use relationships::{HasAttached, HasMany};
pub use states::StateRegistry;
pub use traits::{mutator, Association, BoxFuture, HookFn, Mutator, PersistFn, TapFn};

use traits::{boxed_async, BuildMode, Layer, MakeFn};

/// Builder for test data of type `T`
pub struct Factory<T> {
    make_fn: MakeFn<T>,
    defaults: Vec<Layer<T>>,
    raw_defaults: Vec<Mutator<T>>,
    traits: Vec<Mutator<T>>,
    sequences: Vec<Mutator<T>>,
    states: StateRegistry<T>,
    persist: Option<PersistFn<T>>,
    before: Vec<HookFn<T>>,
    after: Vec<HookFn<T>>,
    tap: Option<TapFn<T>>,
    seq: Arc<AtomicI64>,
    config: FactoryConfig,
}

impl<T: Send + 'static> Factory<T> {
    /// Create a factory from a constructor receiving the sequence number
    pub fn new<F>(make_fn: F) -> Self
    where
        F: Fn(i64) -> T + Send + Sync + 'static,
    {
        Self {
            make_fn: Arc::new(make_fn),
            defaults: Vec::new(),
            raw_defaults: Vec::new(),
            traits: Vec::new(),
            sequences: Vec::new(),
            states: StateRegistry::new(),
            persist: None,
            before: Vec::new(),
            after: Vec::new(),
            tap: None,
            seq: Arc::new(AtomicI64::new(0)),
            config: FactoryConfig::default(),
        }
    }

    /// Create a factory whose constructor also receives a [`Faker`] seeded
    /// from `config.seed` and the sequence number.
    ///
    /// The same seed and sequence always produce the same item.
    pub fn faked<F>(config: FactoryConfig, make_fn: F) -> Self
    where
        F: Fn(i64, &mut Faker) -> T + Send + Sync + 'static,
    {
        let seed = config.seed;
        Self::new(move |seq| {
            let mut faker = Faker::for_sequence(seed, seq);
            make_fn(seq, &mut faker)
        })
        .with_config(config)
    }

    pub fn with_config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Add a default applied before everything else
    pub fn with_default<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.defaults.push(Layer::Mutate(Arc::new(f)));
        self
    }

    pub fn with_defaults<I>(mut self, mutators: I) -> Self
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        self.defaults
            .extend(mutators.into_iter().map(Layer::Mutate));
        self
    }

    /// Add a default that wires in a related model.
    ///
    /// It runs in the defaults stage: `make*`/`raw*` call
    /// [`Association::associate`], `create*` call
    /// [`Association::associate_persisted`] before any hook runs.
    pub fn with_association<A>(mut self, association: A) -> Self
    where
        A: Association<T> + 'static,
    {
        self.defaults.push(Layer::Associate(Arc::new(association)));
        self
    }

    /// Add a default applied only by `raw*` calls.
    ///
    /// Meant for attributes that belong in API payloads but not in the
    /// persisted model, such as a plain-text password.
    pub fn with_raw_default<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.raw_defaults.push(Arc::new(f));
        self
    }

    pub fn with_raw_defaults<I>(mut self, mutators: I) -> Self
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        self.raw_defaults.extend(mutators);
        self
    }

    /// Add a global trait applied to every item after the defaults
    pub fn with_trait<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.traits.push(Arc::new(f));
        self
    }

    pub fn with_traits<I>(mut self, mutators: I) -> Self
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        self.traits.extend(mutators);
        self
    }

    /// Replace the sequence cycle: item `n` gets entry `(n - 1) % len`
    pub fn sequence<I>(mut self, mutators: I) -> Self
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        self.sequences = mutators.into_iter().collect();
        self
    }

    /// Register a named state, overwriting an existing one
    pub fn define_state<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.states.define(name, Arc::new(f));
        self
    }

    pub fn states(&self) -> &StateRegistry<T> {
        &self.states
    }

    /// Return a new factory with the named state appended to its traits.
    ///
    /// The new factory starts its own sequence at 0.
    ///
    /// # Panics
    /// Panics if no state with this name was defined.
    pub fn state(&self, name: &str) -> Self {
        match self.try_state(name) {
            Ok(factory) => factory,
            Err(_) => panic!("factory: unknown state '{}'", name),
        }
    }

    /// Like [`Factory::state`], returning `FactoryError::UnknownState`
    /// instead of panicking.
    pub fn try_state(&self, name: &str) -> FactoryResult<Self> {
        let state = self.states.resolve(name)?;
        let mut factory = self.duplicate();
        factory.traits.push(state);
        Ok(factory)
    }

    /// Set how items are stored; required by the `create*` methods
    pub fn with_persist<F, Fut>(mut self, persist: F) -> Self
    where
        F: Fn(Context, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FactoryResult<T>> + Send + 'static,
    {
        self.persist = Some(boxed_async(persist));
        self
    }

    /// Add a hook run before persistence. An error aborts the create.
    pub fn before_create<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FactoryResult<T>> + Send + 'static,
    {
        self.before.push(boxed_async(hook));
        self
    }

    /// Add a hook run after persistence. Stored items are not rolled back
    /// when it fails.
    pub fn after_create<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FactoryResult<T>> + Send + 'static,
    {
        self.after.push(boxed_async(hook));
        self
    }

    /// Observe every produced item (debugging, logging)
    pub fn tap<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.tap = Some(Arc::new(f));
        self
    }

    /// Add traits only if `condition` holds right now
    pub fn when<I>(mut self, condition: bool, mutators: I) -> Self
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        if condition {
            self.traits.extend(mutators);
        }
        self
    }

    /// Add traits only if `condition` is false right now
    pub fn unless<I>(self, condition: bool, mutators: I) -> Self
    where
        I: IntoIterator<Item = Mutator<T>>,
    {
        self.when(!condition, mutators)
    }

    /// Copy every layer, state, hook and setting into an independent
    /// factory whose sequence starts at 0.
    pub fn duplicate(&self) -> Self {
        let mut factory = self.derive();
        factory.seq = Arc::new(AtomicI64::new(0));
        factory
    }

    /// Copy of this factory that keeps drawing from the same sequence
    pub(crate) fn derive(&self) -> Self {
        Self {
            make_fn: Arc::clone(&self.make_fn),
            defaults: self.defaults.clone(),
            raw_defaults: self.raw_defaults.clone(),
            traits: self.traits.clone(),
            sequences: self.sequences.clone(),
            states: self.states.clone(),
            persist: self.persist.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            tap: self.tap.clone(),
            seq: Arc::clone(&self.seq),
            config: self.config.clone(),
        }
    }

    /// Reset the sequence so the next item gets 1
    pub fn reset_sequence(&self) -> &Self {
        self.seq.store(0, Ordering::SeqCst);
        self
    }

    /// The last sequence number handed out (0 before the first item)
    pub fn current_sequence(&self) -> i64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Fluent batch view: `factory.count(3).make()`
    pub fn count(&self, n: usize) -> Counted<T> {
        Counted::new(self.derive(), n)
    }

    pub fn times(&self, n: usize) -> Counted<T> {
        self.count(n)
    }

    pub(crate) fn label(&self) -> &str {
        match &self.config.name {
            Some(name) => name,
            None => short_type_name::<T>(),
        }
    }

    fn next_seq(&self) -> i64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_persist(&self, operation: &str) -> PersistFn<T> {
        match &self.persist {
            Some(persist) => Arc::clone(persist),
            None => panic!(
                "factory: {} called without persist function; use with_persist",
                operation
            ),
        }
    }

    fn build(&self, mode: BuildMode, overrides: &[Mutator<T>]) -> T {
        let seq = self.next_seq();
        let mut item = (self.make_fn)(seq);

        for layer in &self.defaults {
            match layer {
                Layer::Mutate(f) => f(&mut item),
                Layer::Associate(association) => association.associate(&mut item),
            }
        }
        if mode == BuildMode::Raw {
            for f in &self.raw_defaults {
                f(&mut item);
            }
        }

        self.finish(seq, &mut item, overrides);
        item
    }

    /// Same layers as a standard build, but belongs-to parents are
    /// persisted instead of only built.
    async fn build_for_create(&self, ctx: &Context, overrides: &[Mutator<T>]) -> FactoryResult<T> {
        let seq = self.next_seq();
        let mut item = (self.make_fn)(seq);

        for layer in &self.defaults {
            match layer {
                Layer::Mutate(f) => f(&mut item),
                Layer::Associate(association) => {
                    association.associate_persisted(ctx, &mut item).await?
                }
            }
        }

        self.finish(seq, &mut item, overrides);
        Ok(item)
    }

    fn finish(&self, seq: i64, item: &mut T, overrides: &[Mutator<T>]) {
        for f in &self.traits {
            f(item);
        }
        if !self.sequences.is_empty() {
            let idx = (seq - 1).rem_euclid(self.sequences.len() as i64) as usize;
            (self.sequences[idx])(item);
        }
        for f in overrides {
            f(item);
        }

        if let Some(tap) = &self.tap {
            tap(item);
        }
        tracing::trace!(factory = self.label(), seq, "built item");
    }

    /// Build one item without persisting it
    pub fn make(&self) -> T {
        self.build(BuildMode::Standard, &[])
    }

    pub fn make_with(&self, overrides: &[Mutator<T>]) -> T {
        self.build(BuildMode::Standard, overrides)
    }

    pub fn make_many(&self, count: usize) -> Vec<T> {
        self.make_many_with(count, &[])
    }

    pub fn make_many_with(&self, count: usize, overrides: &[Mutator<T>]) -> Vec<T> {
        (0..count)
            .map(|_| self.build(BuildMode::Standard, overrides))
            .collect()
    }

    /// Build one item with raw defaults applied
    pub fn raw(&self) -> T {
        self.build(BuildMode::Raw, &[])
    }

    pub fn raw_with(&self, overrides: &[Mutator<T>]) -> T {
        self.build(BuildMode::Raw, overrides)
    }

    pub fn raw_many(&self, count: usize) -> Vec<T> {
        self.raw_many_with(count, &[])
    }

    pub fn raw_many_with(&self, count: usize, overrides: &[Mutator<T>]) -> Vec<T> {
        (0..count)
            .map(|_| self.build(BuildMode::Raw, overrides))
            .collect()
    }

    /// Build, run hooks and persist one item
    ///
    /// # Panics
    /// Panics if no persist function was configured.
    pub async fn create(&self, ctx: &Context) -> FactoryResult<T> {
        self.create_with(ctx, &[]).await
    }

    pub async fn create_with(&self, ctx: &Context, overrides: &[Mutator<T>]) -> FactoryResult<T> {
        let persist = self.ensure_persist("create");
        let mut item = self.build_for_create(ctx, overrides).await?;

        for hook in &self.before {
            item = hook(ctx.clone(), item).await.map_err(|err| {
                tracing::debug!(factory = self.label(), error = %err, "before_create hook failed");
                err
            })?;
        }

        let mut saved = persist(ctx.clone(), item).await.map_err(|err| {
            tracing::debug!(factory = self.label(), error = %err, "persist failed");
            err
        })?;

        for hook in &self.after {
            saved = hook(ctx.clone(), saved).await.map_err(|err| {
                tracing::debug!(factory = self.label(), error = %err, "after_create hook failed");
                err
            })?;
        }

        Ok(saved)
    }

    /// Create `count` items one after another.
    ///
    /// On failure the items created so far are returned with the error.
    pub async fn create_many(
        &self,
        ctx: &Context,
        count: usize,
    ) -> Result<Vec<T>, PartialFailure<Vec<T>>> {
        self.create_many_with(ctx, count, &[]).await
    }

    pub async fn create_many_with(
        &self,
        ctx: &Context,
        count: usize,
        overrides: &[Mutator<T>],
    ) -> Result<Vec<T>, PartialFailure<Vec<T>>> {
        self.ensure_persist("create_many");

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            match self.create_with(ctx, overrides).await {
                Ok(item) => items.push(item),
                Err(error) => {
                    tracing::debug!(
                        factory = self.label(),
                        created = items.len(),
                        requested = count,
                        "create_many stopped early"
                    );
                    return Err(PartialFailure::new(error, items));
                }
            }
        }
        Ok(items)
    }

    /// Create one item, panicking on any error
    pub async fn must_create(&self, ctx: &Context) -> T {
        self.must_create_with(ctx, &[]).await
    }

    pub async fn must_create_with(&self, ctx: &Context, overrides: &[Mutator<T>]) -> T {
        match self.create_with(ctx, overrides).await {
            Ok(item) => item,
            Err(err) => panic!("factory: must_create failed: {}", err),
        }
    }

    pub async fn must_create_many(&self, ctx: &Context, count: usize) -> Vec<T> {
        match self.create_many(ctx, count).await {
            Ok(items) => items,
            Err(failure) => panic!("factory: must_create_many failed: {}", failure),
        }
    }
}

impl<T: Serialize + Send + 'static> Factory<T> {
    /// Build one raw item and encode it as JSON
    pub fn raw_json(&self) -> FactoryResult<Vec<u8>> {
        self.raw_json_with(&[])
    }

    pub fn raw_json_with(&self, overrides: &[Mutator<T>]) -> FactoryResult<Vec<u8>> {
        let item = self.raw_with(overrides);
        Ok(serde_json::to_vec(&item)?)
    }

    /// Build `count` raw items and encode them as a JSON array
    pub fn raw_many_json(&self, count: usize) -> FactoryResult<Vec<u8>> {
        self.raw_many_json_with(count, &[])
    }

    pub fn raw_many_json_with(
        &self,
        count: usize,
        overrides: &[Mutator<T>],
    ) -> FactoryResult<Vec<u8>> {
        let items = self.raw_many_with(count, overrides);
        Ok(serde_json::to_vec(&items)?)
    }

    pub fn must_raw_json(&self) -> Vec<u8> {
        match self.raw_json() {
            Ok(bytes) => bytes,
            Err(err) => panic!("factory: must_raw_json failed: {}", err),
        }
    }

    pub fn must_raw_many_json(&self, count: usize) -> Vec<u8> {
        match self.raw_many_json(count) {
            Ok(bytes) => bytes,
            Err(err) => panic!("factory: must_raw_many_json failed: {}", err),
        }
    }
}

impl<T> std::fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("model", &std::any::type_name::<T>())
            .field("defaults", &self.defaults.len())
            .field("raw_defaults", &self.raw_defaults.len())
            .field("traits", &self.traits.len())
            .field("sequences", &self.sequences.len())
            .field("states", &self.states.names())
            .field("persist", &self.persist.is_some())
            .field("seq", &self.seq.load(Ordering::SeqCst))
            .finish()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
