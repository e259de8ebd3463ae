//! Function types and core abstractions shared by the factory modules

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::FactoryResult;

/// A function that edits one produced value in place
pub type Mutator<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// Boxed future returned by persist functions and hooks
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = FactoryResult<T>> + Send>>;

/// Stores an item and returns it, possibly with generated fields filled in
pub type PersistFn<T> = Arc<dyn Fn(Context, T) -> BoxFuture<T> + Send + Sync>;

/// Runs before or after persistence; receives the item and hands it back
pub type HookFn<T> = Arc<dyn Fn(Context, T) -> BoxFuture<T> + Send + Sync>;

/// Observes every produced item
pub type TapFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub(crate) type MakeFn<T> = Arc<dyn Fn(i64) -> T + Send + Sync>;

/// Wrap a closure as a [`Mutator`]
pub fn mutator<T, F>(f: F) -> Mutator<T>
where
    F: Fn(&mut T) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn boxed_async<T, F, Fut>(f: F) -> Arc<dyn Fn(Context, T) -> BoxFuture<T> + Send + Sync>
where
    T: 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FactoryResult<T>> + Send + 'static,
{
    Arc::new(move |ctx, item| Box::pin(f(ctx, item)))
}

/// Wires a related model into an item while it is being built.
///
/// `associate` runs on the in-memory paths; `associate_persisted` runs on
/// the create path so the related model is stored before the item.
#[async_trait::async_trait]
pub trait Association<T>: Send + Sync {
    fn associate(&self, item: &mut T);

    async fn associate_persisted(&self, ctx: &Context, item: &mut T) -> FactoryResult<()>;
}

/// An entry in the defaults list
pub(crate) enum Layer<T> {
    Mutate(Mutator<T>),
    Associate(Arc<dyn Association<T>>),
}

impl<T> Clone for Layer<T> {
    fn clone(&self) -> Self {
        match self {
            Layer::Mutate(f) => Layer::Mutate(Arc::clone(f)),
            Layer::Associate(a) => Layer::Associate(Arc::clone(a)),
        }
    }
}

/// Which production path is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuildMode {
    Standard,
    Raw,
}
