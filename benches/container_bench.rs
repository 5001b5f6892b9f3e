//! Benchmarks for container resolution

use bindery::prelude::*;
use bindery::value;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

struct Config {
    url: String,
}

struct Database {
    #[allow(dead_code)]
    config: Arc<Config>,
}

struct Repo {
    #[allow(dead_code)]
    db: Arc<Database>,
}

fn registry() -> Arc<TypeRegistry> {
    let types = TypeRegistry::new();

    types.define(TypeDef::<Config>::new("Config").constructor(
        vec![ParamSpec::with_default(
            "url",
            "sqlite://memory".to_string(),
        )],
        |args| {
            Ok(Config {
                url: value::arg::<String>(args, 0)?.as_ref().clone(),
            })
        },
    ));

    types.define(TypeDef::<Database>::new("Database").constructor(
        vec![ParamSpec::of_type("config", "Config")],
        |args| {
            Ok(Database {
                config: value::arg::<Config>(args, 0)?,
            })
        },
    ));

    types.define(TypeDef::<Repo>::new("Repo").constructor(
        vec![ParamSpec::of_type("db", "Database")],
        |args| {
            Ok(Repo {
                db: value::arg::<Database>(args, 0)?,
            })
        },
    ));

    Arc::new(types)
}

fn bench_singleton_cache_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = Container::with_reflector(registry());
    container.singleton_self("Config");
    container.get("Config").unwrap(); // populate the cache

    group.bench_function("singleton_cache_hit", |b| {
        b.iter(|| black_box(container.get("Config").unwrap()));
    });

    group.finish();
}

fn bench_transient_autowire(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = Container::with_reflector(registry());
    container.singleton_self("Config");

    // Repo -> Database -> Config: two reflective constructions per resolve
    group.bench_function("transient_autowire_depth_2", |b| {
        b.iter(|| black_box(container.get("Repo").unwrap()));
    });

    group.finish();
}

fn bench_alias_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = Container::with_reflector(registry());
    container.bind("A", "B");
    container.bind("B", "C");
    container.bind("C", "Config");

    group.bench_function("alias_chain_3_hops", |b| {
        b.iter(|| black_box(container.get("A").unwrap()));
    });

    group.finish();
}

fn bench_factory(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = Container::with_reflector(registry());
    container.bind_factory("Conn", |c, _| {
        let config = c.get_as::<Config>("Config")?;
        Ok(format!("conn to {}", config.url))
    });

    group.bench_function("transient_factory", |b| {
        b.iter(|| black_box(container.get("Conn").unwrap()));
    });

    group.finish();
}

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");
    group.throughput(Throughput::Elements(1));

    let container = Container::with_reflector(registry());

    group.bench_function("bind_overwrite", |b| {
        b.iter(|| container.bind(black_box("Repo"), "Database"));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_singleton_cache_hit,
    bench_transient_autowire,
    bench_alias_chain,
    bench_factory,
    bench_registration,
);
criterion_main!(benches);
