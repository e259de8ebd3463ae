//! Seeding Example
//!
//! Seeds an in-memory store through every relationship helper.
//!
//! Run with `RUST_LOG=elif_factory=trace cargo run --example seeding` to see
//! one event per built item.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use elif_factory::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Database {
    next_id: AtomicI64,
    tables: Mutex<BTreeMap<&'static str, usize>>,
}

impl Database {
    fn insert(&self, table: &'static str) -> i64 {
        *self.tables.lock().unwrap().entry(table).or_default() += 1;
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Clone, Default)]
struct User {
    id: i64,
    name: String,
    email: String,
    role: String,
}

#[derive(Debug, Clone, Default)]
struct Post {
    id: i64,
    user_id: i64,
    title: String,
    body: String,
}

#[derive(Debug, Clone, Default)]
struct Tag {
    id: i64,
    label: String,
}

#[derive(Debug, Clone, Default)]
struct PostTag {
    id: i64,
    post_id: i64,
    tag_id: i64,
}

fn persisted<T, F>(factory: Factory<T>, db: &Arc<Database>, table: &'static str, set_id: F) -> Factory<T>
where
    T: Send + 'static,
    F: Fn(&mut T, i64) + Send + Sync + 'static,
{
    let db = Arc::clone(db);
    factory.with_persist(move |_ctx, mut item: T| {
        set_id(&mut item, db.insert(table));
        async move { Ok(item) }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db = Arc::new(Database::default());
    let ctx = Context::new();
    let config = FactoryConfig::from_env();

    let users = persisted(
        Factory::faked(config.clone().with_name("users"), |_seq, fake| User {
            name: fake.name(),
            email: fake.email(),
            role: "member".to_string(),
            ..Default::default()
        })
        .define_state("admin", |u| u.role = "admin".to_string()),
        &db,
        "users",
        |u, id| u.id = id,
    );

    let posts = persisted(
        Factory::faked(config.clone().with_name("posts"), |seq, fake| Post {
            title: format!("Post {}", seq),
            body: fake.paragraph(),
            ..Default::default()
        }),
        &db,
        "posts",
        |p, id| p.id = id,
    );

    let tags = persisted(
        Factory::new(|seq| Tag {
            label: format!("tag-{}", seq),
            ..Default::default()
        }),
        &db,
        "tags",
        |t, id| t.id = id,
    );

    let post_tags = persisted(Factory::new(|_| PostTag::default()), &db, "post_tags", |pt, id| {
        pt.id = id
    });

    let admin = users.state("admin").create(&ctx).await?;
    println!("admin: {} <{}>", admin.name, admin.email);

    // Every post gets its own freshly stored author.
    let guest_posts = posts
        .for_parent(&users, |p: &mut Post, u: &User| p.user_id = u.id)
        .create_many(&ctx, 2)
        .await?;
    println!("guest posts: {:?}", guest_posts.iter().map(|p| p.user_id).collect::<Vec<_>>());

    // All of these share the admin as author.
    let admin_posts = posts
        .recycle(admin.clone(), |p: &mut Post, u: &User| p.user_id = u.id)
        .count(3)
        .create(&ctx)
        .await?;
    println!("admin posts: {}", admin_posts.len());

    let (author, drafts) = users
        .has(&posts, 4, |u: &User, p: &mut Post| p.user_id = u.id)
        .create(&ctx)
        .await?;
    println!("{} wrote {} posts", author.name, drafts.len());

    let (post, attached, pivots) = posts
        .has_attached(&tags, &post_tags, 3, |pt: &mut PostTag, p: &Post, t: &Tag| {
            pt.post_id = p.id;
            pt.tag_id = t.id;
        })
        .create(&ctx)
        .await?;
    println!(
        "'{}' tagged with {:?} ({} pivots)",
        post.title,
        attached.iter().map(|t| t.label.as_str()).collect::<Vec<_>>(),
        pivots.len()
    );

    for (table, rows) in db.tables.lock().unwrap().iter() {
        println!("{:>10}: {}", table, rows);
    }

    Ok(())
}
