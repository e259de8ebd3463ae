//! Fluent batch view returned by `Factory::count`

use serde::Serialize;

use super::traits::Mutator;
use super::Factory;
use crate::context::Context;
use crate::error::{FactoryResult, PartialFailure};

/// A factory paired with the number of items to produce.
///
/// Shares the sequence of the factory it came from.
pub struct Counted<T> {
    factory: Factory<T>,
    count: usize,
}

impl<T: Send + 'static> Counted<T> {
    pub(crate) fn new(factory: Factory<T>, count: usize) -> Self {
        Self { factory, count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn factory(&self) -> &Factory<T> {
        &self.factory
    }

    /// Apply a named state, keeping the same count
    ///
    /// # Panics
    /// Panics if no state with this name was defined.
    pub fn state(&self, name: &str) -> Self {
        Self::new(self.factory.state(name), self.count)
    }

    pub fn make(&self) -> Vec<T> {
        self.factory.make_many(self.count)
    }

    pub fn make_with(&self, overrides: &[Mutator<T>]) -> Vec<T> {
        self.factory.make_many_with(self.count, overrides)
    }

    pub fn raw(&self) -> Vec<T> {
        self.factory.raw_many(self.count)
    }

    pub fn raw_with(&self, overrides: &[Mutator<T>]) -> Vec<T> {
        self.factory.raw_many_with(self.count, overrides)
    }

    pub async fn create(&self, ctx: &Context) -> Result<Vec<T>, PartialFailure<Vec<T>>> {
        self.factory.create_many(ctx, self.count).await
    }

    pub async fn create_with(
        &self,
        ctx: &Context,
        overrides: &[Mutator<T>],
    ) -> Result<Vec<T>, PartialFailure<Vec<T>>> {
        self.factory.create_many_with(ctx, self.count, overrides).await
    }

    pub async fn must_create(&self, ctx: &Context) -> Vec<T> {
        self.factory.must_create_many(ctx, self.count).await
    }
}

impl<T: Serialize + Send + 'static> Counted<T> {
    pub fn raw_json(&self) -> FactoryResult<Vec<u8>> {
        self.factory.raw_many_json(self.count)
    }

    pub fn raw_json_with(&self, overrides: &[Mutator<T>]) -> FactoryResult<Vec<u8>> {
        self.factory.raw_many_json_with(self.count, overrides)
    }

    pub fn must_raw_json(&self) -> Vec<u8> {
        self.factory.must_raw_many_json(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::mutator;

    #[derive(Debug, Clone, Default, Serialize)]
    struct Post {
        id: u64,
        title: String,
        published: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview_token: Option<String>,
    }

    fn post_factory() -> Factory<Post> {
        Factory::new(|seq| Post {
            title: format!("Post {}", seq),
            ..Default::default()
        })
        .define_state("published", |p| p.published = true)
    }

    #[test]
    fn test_count_make() {
        let posts = post_factory().count(3).make();
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 1", "Post 2", "Post 3"]);
    }

    #[test]
    fn test_count_shares_sequence() {
        let factory = post_factory();
        factory.count(2).make();
        assert_eq!(factory.make().title, "Post 3");
    }

    #[test]
    fn test_times_alias() {
        let counted = post_factory().times(4);
        assert_eq!(counted.count(), 4);
        assert_eq!(counted.make().len(), 4);
    }

    #[test]
    fn test_count_with_state() {
        let posts = post_factory().count(2).state("published").make();
        assert!(posts.iter().all(|p| p.published));
    }

    #[test]
    fn test_count_with_overrides() {
        let posts = post_factory()
            .count(2)
            .make_with(&[mutator(|p: &mut Post| p.title = "Fixed".to_string())]);
        assert!(posts.iter().all(|p| p.title == "Fixed"));
    }

    #[test]
    fn test_count_raw_json() {
        let factory = post_factory().with_raw_default(|p| p.preview_token = Some("tok".to_string()));

        let value: serde_json::Value =
            serde_json::from_slice(&factory.count(3).must_raw_json()).unwrap();
        let items = value.as_array().unwrap();

        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item["preview_token"] == "tok"));
        assert!(factory.count(2).raw().iter().all(|p| p.preview_token.is_some()));
    }

    #[tokio::test]
    async fn test_count_create() {
        let factory = post_factory().with_persist(|_ctx, mut p: Post| async move {
            p.id = 100 + p.title.len() as u64;
            Ok(p)
        });

        let posts = factory.count(3).create(&Context::new()).await.unwrap();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().all(|p| p.id > 100));

        let more = factory.count(2).must_create(&Context::new()).await;
        assert_eq!(more[1].title, "Post 5");
    }
}
