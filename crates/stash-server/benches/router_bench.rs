use axum::{body::Body, http::Request};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use stash_server::metrics::detached_handle;
use stash_server::{AppState, create_router_with_state};
use stash_store::stash_core::cache_args;
use stash_store::{CacheConfig, CacheStore, MemoryStore};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tower::ServiceExt;

/// Benchmark: GET de una entry cacheada a traves del stack completo
fn bench_get_entry(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let router = rt.block_on(async {
        let cache = CacheStore::open(Arc::new(MemoryStore::new()), CacheConfig::default()).await;
        cache
            .set(
                "FilingService",
                "search",
                &cache_args!(company = "Acme"),
                json!({"form": "10-K", "year": 2024}),
                None,
            )
            .await;
        create_router_with_state(AppState::with_defaults(cache), detached_handle())
    });

    c.bench_function("router_get_entry", |b| {
        b.to_async(&rt).iter(|| async {
            let request = Request::builder()
                .uri("/cache/FilingService/search/entry?company=Acme")
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            std::hint::black_box(response)
        });
    });
}

/// Benchmark: GET /health sin backend
fn bench_liveness(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let router = stash_server::create_router();

    c.bench_function("router_liveness", |b| {
        b.to_async(&rt).iter(|| async {
            let request = Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            std::hint::black_box(response)
        });
    });
}

criterion_group!(benches, bench_get_entry, bench_liveness);
criterion_main!(benches);
