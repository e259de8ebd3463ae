//! Factory Performance Benchmark
//!
//! Baselines for in-memory construction, serialization and the create path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use elif_factory::{mutator, Context, Factory, FactoryConfig};
use serde::Serialize;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Default, Serialize)]
struct User {
    id: i64,
    name: String,
    email: String,
    role: String,
    active: bool,
}

#[derive(Debug, Clone, Default)]
struct Post {
    id: i64,
    user_id: i64,
    title: String,
}

fn user_factory() -> Factory<User> {
    Factory::new(|seq| User {
        name: format!("User {}", seq),
        email: format!("user{}@example.com", seq),
        ..Default::default()
    })
    .with_default(|u| u.active = true)
    .define_state("admin", |u| u.role = "admin".to_string())
}

fn post_factory() -> Factory<Post> {
    Factory::new(|seq| Post {
        title: format!("Post {}", seq),
        ..Default::default()
    })
}

fn bench_make(c: &mut Criterion) {
    let mut group = c.benchmark_group("make");

    let plain = user_factory();
    group.bench_function("plain", |b| b.iter(|| black_box(plain.make())));

    let layered = user_factory()
        .with_trait(|u| u.email.make_ascii_lowercase())
        .sequence([
            mutator(|u: &mut User| u.role = "member".to_string()),
            mutator(|u: &mut User| u.role = "guest".to_string()),
        ])
        .state("admin");
    group.bench_function("traits_state_sequence", |b| {
        b.iter(|| black_box(layered.make()))
    });

    let faked = Factory::faked(FactoryConfig::new().with_seed(7), |seq, fake| User {
        id: seq,
        name: fake.name(),
        email: fake.email(),
        ..Default::default()
    });
    group.bench_function("faked", |b| b.iter(|| black_box(faked.make())));

    group.finish();
}

fn bench_make_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_many");
    let factory = user_factory();

    for &count in &[10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| black_box(factory.make_many(count)))
        });
    }

    group.finish();
}

fn bench_raw_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_json");
    let factory = user_factory().with_raw_default(|u| u.role = "api".to_string());

    group.bench_function("single", |b| b.iter(|| black_box(factory.must_raw_json())));
    group.bench_function("many_100", |b| {
        b.iter(|| black_box(factory.must_raw_many_json(100)))
    });

    group.finish();
}

fn bench_create(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("create");
    let ctx = Context::new();

    let factory = user_factory()
        .before_create(|_ctx, u: User| async move { Ok(u) })
        .with_persist(|_ctx, mut u: User| async move {
            u.id = 1;
            Ok(u)
        })
        .after_create(|_ctx, u: User| async move { Ok(u) });

    group.bench_function("with_hooks", |b| {
        b.iter(|| rt.block_on(async { black_box(factory.create(&ctx).await.unwrap()) }))
    });

    group.finish();
}

fn bench_duplicate(c: &mut Criterion) {
    let factory = user_factory()
        .with_trait(|u| u.active = false)
        .define_state("inactive", |u| u.active = false);

    c.bench_function("duplicate", |b| b.iter(|| black_box(factory.duplicate())));
}

fn bench_relationships(c: &mut Criterion) {
    let mut group = c.benchmark_group("relationships");
    let users = user_factory();
    let posts = post_factory();

    let owned = posts.for_parent(&users, |p: &mut Post, u: &User| p.user_id = u.id);
    group.bench_function("for_parent", |b| {
        b.iter(|| {
            let post = owned.make();
            black_box((post.id, post.user_id, post.title.len()))
        })
    });

    for &count in &[5usize, 50] {
        group.bench_with_input(BenchmarkId::new("has", count), &count, |b, &count| {
            b.iter(|| {
                black_box(
                    users
                        .has(&posts, count, |u: &User, p: &mut Post| p.user_id = u.id)
                        .make(),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_make,
    bench_make_many,
    bench_raw_json,
    bench_create,
    bench_duplicate,
    bench_relationships
);
criterion_main!(benches);
