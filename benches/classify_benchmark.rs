//! Benchmarks for hostshield classification performance.
//!
//! Run with: cargo bench
//!
//! This benchmark suite measures:
//! - Classification throughput with a warm cache
//! - Cache hit vs miss latency
//! - Wildcard walk cost for deep host names
//! - Scalability with different rule table sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hostshield::cache::resolve;
use hostshield::{CacheConfig, Classification, HostCache, MemoryRuleStore};
use std::sync::Arc;

/// Generate a rule store with exact and wildcard rules.
fn generate_store(exact_count: usize, wildcard_count: usize) -> Arc<MemoryRuleStore> {
    let store = MemoryRuleStore::new();

    for i in 0..exact_count {
        let classification = match i % 3 {
            0 => Classification::Blocked,
            1 => Classification::Allowed,
            _ => Classification::redirect("127.0.0.1"),
        };
        store
            .add_rule(&format!("host{}.example.com", i), classification)
            .unwrap();
    }

    for i in 0..wildcard_count {
        store
            .add_rule(&format!("*.tracker{}.net", i), Classification::Blocked)
            .unwrap();
    }

    Arc::new(store)
}

/// Generate queries - mix of exact, wildcard and unmatched hosts.
fn generate_queries(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 3 {
            0 => format!("host{}.example.com", i % 1000),
            1 => format!("cdn.a{}.tracker{}.net", i, i % 1000),
            _ => format!("unknown{}.nonexistent.org", i),
        })
        .collect()
}

/// Benchmark classification throughput with a warm cache.
fn bench_classify_warm(c: &mut Criterion) {
    let store = generate_store(10_000, 5_000);
    let cache = HostCache::new(store, CacheConfig::with_capacity(10_000));
    let queries = generate_queries(1000);

    for query in &queries {
        let _ = cache.classify(query);
    }

    let mut group = c.benchmark_group("classify_warm");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("mixed_queries", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(cache.classify(query));
            }
        })
    });

    group.finish();
}

/// Benchmark cache miss vs hit latency.
fn bench_cache_performance(c: &mut Criterion) {
    let store = generate_store(10_000, 5_000);
    let cache = HostCache::new(store, CacheConfig::default());

    let mut group = c.benchmark_group("cache_performance");

    group.bench_function("single_query_miss", |b| {
        b.iter_batched(
            || {
                cache.evict_all();
                "host500.example.com"
            },
            |query| black_box(cache.classify(query)),
            criterion::BatchSize::SmallInput,
        )
    });

    let _ = cache.classify("host500.example.com");
    group.bench_function("single_query_hit", |b| {
        b.iter(|| black_box(cache.classify("host500.example.com")))
    });

    // Unmatched hosts are never cached and always walk the hierarchy
    group.bench_function("unclassified", |b| {
        b.iter(|| black_box(cache.classify("a.b.c.d.nonexistent.org")))
    });

    group.finish();
}

/// Benchmark the wildcard walk by host depth.
fn bench_wildcard_depth(c: &mut Criterion) {
    let store = generate_store(0, 1);
    let mut group = c.benchmark_group("wildcard_depth");

    for depth in [1usize, 4, 8, 16].iter() {
        let host = format!("{}tracker0.net", "x.".repeat(*depth));
        group.bench_with_input(BenchmarkId::new("labels", depth), &host, |b, host| {
            b.iter(|| black_box(resolve(store.as_ref(), host).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark scalability with different rule table sizes.
fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for size in [100, 1_000, 10_000, 50_000].iter() {
        let store = generate_store(*size, size / 2);
        let cache = HostCache::new(store, CacheConfig::with_capacity(64));

        group.throughput(Throughput::Elements(100));
        group.bench_with_input(BenchmarkId::new("rules", size), size, |b, _| {
            let queries: Vec<_> = (0..100)
                .map(|i| format!("host{}.example.com", i % size))
                .collect();
            b.iter(|| {
                for query in &queries {
                    black_box(cache.classify(query));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classify_warm,
    bench_cache_performance,
    bench_wildcard_depth,
    bench_scalability
);
criterion_main!(benches);
