//! Relationship support for creating related models
//!
//! - [`Factory::for_parent`]: belongs-to with a fresh parent per item
//! - [`Factory::for_model`] / [`Factory::recycle`]: belongs-to an existing parent
//! - [`Factory::has`]: one parent with `count` children
//! - [`Factory::has_attached`]: one parent, `count` related models and one
//!   pivot record per related model
//!
//! Persisting variants store parents before the models pointing at them.
//! When a step fails the whole operation stops and everything stored so
//! far is returned next to the error; nothing is rolled back.

use std::sync::Arc;

use super::traits::{mutator, Association, Mutator};
use super::Factory;
use crate::context::Context;
use crate::error::{
    FactoryError, FactoryResult, HasAttachedPartial, HasManyPartial, PartialFailure,
};

type LinkFn<T, R> = Arc<dyn Fn(&mut T, &R) + Send + Sync>;

/// Builds (or creates) a new parent for each item
struct BelongsTo<T, R> {
    parent: Factory<R>,
    link: LinkFn<T, R>,
}

#[async_trait::async_trait]
impl<T, R> Association<T> for BelongsTo<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    fn associate(&self, item: &mut T) {
        let parent = self.parent.make();
        (self.link)(item, &parent);
    }

    async fn associate_persisted(&self, ctx: &Context, item: &mut T) -> FactoryResult<()> {
        let parent = self.parent.create(ctx).await?;
        (self.link)(item, &parent);
        Ok(())
    }
}

impl<T: Send + 'static> Factory<T> {
    /// Belongs-to: every item gets its own parent from `parent`.
    ///
    /// `make`/`raw` build the parent in memory; `create` persists it first.
    /// The returned factory shares this factory's sequence.
    pub fn for_parent<R, F>(&self, parent: &Factory<R>, link: F) -> Self
    where
        R: Send + 'static,
        F: Fn(&mut T, &R) + Send + Sync + 'static,
    {
        let association = BelongsTo {
            parent: parent.derive(),
            link: Arc::new(link),
        };

        self.derive().with_association(association)
    }

    /// Belongs-to an existing parent shared by every item
    pub fn for_model<R, F>(&self, parent: R, link: F) -> Self
    where
        R: Send + Sync + 'static,
        F: Fn(&mut T, &R) + Send + Sync + 'static,
    {
        let mut factory = self.derive();
        factory
            .traits
            .push(mutator(move |item: &mut T| link(item, &parent)));
        factory
    }

    /// Alias of [`Factory::for_model`]
    pub fn recycle<R, F>(&self, parent: R, link: F) -> Self
    where
        R: Send + Sync + 'static,
        F: Fn(&mut T, &R) + Send + Sync + 'static,
    {
        self.for_model(parent, link)
    }

    /// One parent from this factory with `count` children from `child`
    pub fn has<'a, C, F>(&'a self, child: &'a Factory<C>, count: usize, link: F) -> HasMany<'a, T, C>
    where
        C: Send + 'static,
        F: Fn(&T, &mut C) + Send + Sync + 'static,
    {
        HasMany::new(self, child, count, link)
    }

    /// One parent from this factory attached to `count` related models
    /// through pivot records
    pub fn has_attached<'a, R, V, F>(
        &'a self,
        related: &'a Factory<R>,
        pivot: &'a Factory<V>,
        count: usize,
        link: F,
    ) -> HasAttached<'a, T, R, V>
    where
        R: Send + 'static,
        V: Send + 'static,
        F: Fn(&mut V, &T, &R) + Send + Sync + 'static,
    {
        HasAttached::new(self, related, pivot, count, link)
    }
}

/// Has-many relationship builder
pub struct HasMany<'a, P, C> {
    parent: &'a Factory<P>,
    child: &'a Factory<C>,
    count: usize,
    link: Arc<dyn Fn(&P, &mut C) + Send + Sync>,
}

impl<'a, P, C> HasMany<'a, P, C> {
    pub fn new<F>(parent: &'a Factory<P>, child: &'a Factory<C>, count: usize, link: F) -> Self
    where
        F: Fn(&P, &mut C) + Send + Sync + 'static,
    {
        Self {
            parent,
            child,
            count,
            link: Arc::new(link),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<'a, P, C> HasMany<'a, P, C>
where
    P: Clone + Send + Sync + 'static,
    C: Send + 'static,
{
    fn children_of(&self, parent: &P) -> Factory<C> {
        let link = Arc::clone(&self.link);
        self.child
            .for_model(parent.clone(), move |child: &mut C, parent: &P| link(parent, child))
    }

    /// Build the parent and its children in memory
    pub fn make(&self) -> (P, Vec<C>) {
        let parent = self.parent.make();
        let children = self.children_of(&parent).make_many(self.count);
        (parent, children)
    }

    /// Persist the parent, then each child linked to it
    pub async fn create(
        &self,
        ctx: &Context,
    ) -> Result<(P, Vec<C>), PartialFailure<HasManyPartial<P, C>>> {
        let parent = match self.parent.create(ctx).await {
            Ok(parent) => parent,
            Err(error) => {
                return Err(PartialFailure::new(
                    error,
                    HasManyPartial {
                        parent: None,
                        children: Vec::new(),
                    },
                ))
            }
        };

        match self.children_of(&parent).create_many(ctx, self.count).await {
            Ok(children) => Ok((parent, children)),
            Err(failure) => {
                let (error, children) = failure.into_parts();
                tracing::debug!(
                    parent = self.parent.label(),
                    child = self.child.label(),
                    created = children.len(),
                    requested = self.count,
                    "has-many create stopped early"
                );
                Err(PartialFailure::new(
                    error,
                    HasManyPartial {
                        parent: Some(parent),
                        children,
                    },
                ))
            }
        }
    }

    pub async fn must_create(&self, ctx: &Context) -> (P, Vec<C>) {
        match self.create(ctx).await {
            Ok(created) => created,
            Err(failure) => panic!("factory: HasMany::must_create failed: {}", failure),
        }
    }
}

/// Many-to-many relationship builder with a pivot model
pub struct HasAttached<'a, P, R, V> {
    parent: &'a Factory<P>,
    related: &'a Factory<R>,
    pivot: &'a Factory<V>,
    count: usize,
    link: Arc<dyn Fn(&mut V, &P, &R) + Send + Sync>,
}

impl<'a, P, R, V> HasAttached<'a, P, R, V> {
    pub fn new<F>(
        parent: &'a Factory<P>,
        related: &'a Factory<R>,
        pivot: &'a Factory<V>,
        count: usize,
        link: F,
    ) -> Self
    where
        F: Fn(&mut V, &P, &R) + Send + Sync + 'static,
    {
        Self {
            parent,
            related,
            pivot,
            count,
            link: Arc::new(link),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<'a, P, R, V> HasAttached<'a, P, R, V>
where
    P: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    fn pivot_link(&self, parent: &Arc<P>, related: &R) -> Mutator<V> {
        let link = Arc::clone(&self.link);
        let parent = Arc::clone(parent);
        let related = related.clone();
        mutator(move |pivot: &mut V| link(pivot, &parent, &related))
    }

    /// Build the parent, related models and pivots in memory
    pub fn make(&self) -> (P, Vec<R>, Vec<V>) {
        let parent = self.parent.make();
        let shared = Arc::new(parent.clone());

        let mut related = Vec::with_capacity(self.count);
        let mut pivots = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let item = self.related.make();
            pivots.push(self.pivot.make_with(&[self.pivot_link(&shared, &item)]));
            related.push(item);
        }

        (parent, related, pivots)
    }

    /// Persist the parent, then for each iteration a related model followed
    /// by its pivot
    pub async fn create(
        &self,
        ctx: &Context,
    ) -> Result<(P, Vec<R>, Vec<V>), PartialFailure<HasAttachedPartial<P, R, V>>> {
        let parent = match self.parent.create(ctx).await {
            Ok(parent) => parent,
            Err(error) => return Err(self.failure(error, None, Vec::new(), Vec::new())),
        };
        let shared = Arc::new(parent.clone());

        let mut related = Vec::with_capacity(self.count);
        let mut pivots = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let item = match self.related.create(ctx).await {
                Ok(item) => item,
                Err(error) => return Err(self.failure(error, Some(parent), related, pivots)),
            };
            let link = self.pivot_link(&shared, &item);
            related.push(item);

            match self.pivot.create_with(ctx, &[link]).await {
                Ok(pivot) => pivots.push(pivot),
                Err(error) => return Err(self.failure(error, Some(parent), related, pivots)),
            }
        }

        Ok((parent, related, pivots))
    }

    pub async fn must_create(&self, ctx: &Context) -> (P, Vec<R>, Vec<V>) {
        match self.create(ctx).await {
            Ok(created) => created,
            Err(failure) => panic!("factory: HasAttached::must_create failed: {}", failure),
        }
    }

    fn failure(
        &self,
        error: FactoryError,
        parent: Option<P>,
        related: Vec<R>,
        pivots: Vec<V>,
    ) -> PartialFailure<HasAttachedPartial<P, R, V>> {
        if parent.is_some() {
            tracing::debug!(
                parent = self.parent.label(),
                related = related.len(),
                pivots = pivots.len(),
                requested = self.count,
                "has-attached create stopped early"
            );
        }
        PartialFailure::new(
            error,
            HasAttachedPartial {
                parent,
                related,
                pivots,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct User {
        id: String,
        name: String,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Post {
        id: String,
        title: String,
        author_id: String,
    }

    fn users() -> Factory<User> {
        Factory::new(|seq| User {
            name: format!("User {}", seq),
            ..Default::default()
        })
        .with_persist(|_ctx, mut u: User| async move {
            u.id = format!("user-{}", u.name);
            Ok(u)
        })
    }

    fn posts() -> Factory<Post> {
        Factory::new(|seq| Post {
            title: format!("Post {}", seq),
            ..Default::default()
        })
        .with_persist(|_ctx, mut p: Post| async move {
            p.id = format!("post-{}", p.title);
            Ok(p)
        })
    }

    #[test]
    fn test_for_parent_builds_parent_per_item() {
        let users = Factory::new(|seq| User {
            id: format!("u{}", seq),
            name: format!("User {}", seq),
        });
        let posts = posts().for_parent(&users, |p: &mut Post, u: &User| p.author_id = u.id.clone());

        let items = posts.make_many(3);
        let authors: Vec<&str> = items.iter().map(|p| p.author_id.as_str()).collect();

        assert_eq!(authors, vec!["u1", "u2", "u3"]);
        assert_eq!(users.current_sequence(), 3);
    }

    #[tokio::test]
    async fn test_for_parent_persists_parent_first() {
        let stored = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&stored);
        let users = users().after_create(move |_ctx, u: User| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(u) }
        });

        let post = posts()
            .for_parent(&users, |p: &mut Post, u: &User| p.author_id = u.id.clone())
            .create(&Context::new())
            .await
            .unwrap();

        assert_eq!(post.author_id, "user-User 1");
        assert_eq!(stored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_for_model_shares_parent() {
        let author = User {
            id: "recycled".to_string(),
            name: "Recycled".to_string(),
        };

        let items = posts()
            .recycle(author, |p: &mut Post, u: &User| p.author_id = u.id.clone())
            .make_many(3);

        assert!(items.iter().all(|p| p.author_id == "recycled"));
    }

    #[test]
    fn test_has_make() {
        let users = users();
        let posts = posts();

        let (user, children) = users
            .has(&posts, 3, |u: &User, p: &mut Post| p.author_id = u.name.clone())
            .make();

        assert_eq!(children.len(), 3);
        assert!(children.iter().all(|p| p.author_id == user.name));
        // Children keep advancing the child factory's sequence.
        assert_eq!(posts.make().title, "Post 4");
    }

    #[tokio::test]
    async fn test_has_create() {
        let users = users();
        let posts = posts();

        let (user, children) = users
            .has(&posts, 5, |u: &User, p: &mut Post| p.author_id = u.id.clone())
            .create(&Context::new())
            .await
            .unwrap();

        assert_eq!(user.id, "user-User 1");
        assert_eq!(children.len(), 5);
        assert!(children.iter().all(|p| !p.id.is_empty() && p.author_id == user.id));
    }

    #[test]
    fn test_has_attached_make() {
        #[derive(Debug, Clone, Default)]
        struct Membership {
            user_id: String,
            post_id: String,
        }

        let users = Factory::new(|seq| User {
            id: format!("u{}", seq),
            name: String::new(),
        });
        let posts = Factory::new(|seq| Post {
            id: format!("p{}", seq),
            ..Default::default()
        });
        let memberships = Factory::new(|_| Membership::default());

        let (user, related, pivots) = users
            .has_attached(&posts, &memberships, 2, |m: &mut Membership, u: &User, p: &Post| {
                m.user_id = u.id.clone();
                m.post_id = p.id.clone();
            })
            .make();

        assert_eq!(related.len(), 2);
        assert_eq!(pivots.len(), 2);
        for (pivot, post) in pivots.iter().zip(&related) {
            assert_eq!(pivot.user_id, user.id);
            assert_eq!(pivot.post_id, post.id);
        }
    }
}
