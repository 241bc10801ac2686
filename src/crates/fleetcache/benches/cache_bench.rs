use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fleetcache::{CacheConfig, CacheManager, SetOptions};
use std::time::Duration;

fn bench_config() -> CacheConfig {
    CacheConfig::new()
        .with_max_size(1000)
        .with_sweep_interval(Duration::from_secs(3600))
}

fn cache_set_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("cache set", |b| {
        b.to_async(&runtime).iter(|| async {
            let cache: CacheManager<String> = CacheManager::new(bench_config()).await;
            for i in 0..100 {
                cache
                    .set(format!("key_{i}"), black_box(format!("value_{i}")))
                    .await;
            }
        });
    });
}

fn cache_get_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("cache get hit", |b| {
        b.to_async(&runtime).iter(|| async {
            let cache: CacheManager<String> = CacheManager::new(bench_config()).await;
            cache.set("key", "value".to_string()).await;
            for _ in 0..100 {
                cache.get(black_box("key")).await;
            }
        });
    });
}

fn cache_eviction_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    // Every insert past the cap pays the linear oldest-entry scan.
    c.bench_function("cache set at capacity", |b| {
        b.to_async(&runtime).iter(|| async {
            let config = CacheConfig::new()
                .with_max_size(100)
                .with_sweep_interval(Duration::from_secs(3600));
            let cache: CacheManager<String> = CacheManager::new(config).await;
            for i in 0..200 {
                cache
                    .set(format!("key_{i}"), black_box("value".to_string()))
                    .await;
            }
        });
    });
}

fn cache_tag_invalidation_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("cache invalidate by tag", |b| {
        b.to_async(&runtime).iter(|| async {
            let cache: CacheManager<String> = CacheManager::new(bench_config()).await;
            for i in 0..100 {
                let tag = if i % 2 == 0 { "even" } else { "odd" };
                cache
                    .set_with(
                        format!("key_{i}"),
                        "value".to_string(),
                        SetOptions::new().with_tag(tag),
                    )
                    .await;
            }
            cache.invalidate_by_tags(black_box(&["even"])).await;
        });
    });
}

criterion_group!(
    benches,
    cache_set_benchmark,
    cache_get_benchmark,
    cache_eviction_benchmark,
    cache_tag_invalidation_benchmark
);
criterion_main!(benches);
