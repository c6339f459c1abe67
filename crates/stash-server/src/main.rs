//! Stash Server binary.

use std::sync::Arc;

use anyhow::Context;
use stash_server::metrics::init_metrics;
use stash_server::{
    AppState, BackendKind, Settings, cors_layer, create_router_with_state, run_server,
};
use stash_store::{
    CacheStore, DocumentStore, MemoryStore, SqliteStore, SweepConfig, SweepScheduler, SweepState,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let addr = settings.socket_addr()?;

    tracing::info!("Starting Stash Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        backend = ?settings.cache.backend.kind,
        collection = %settings.cache.collection,
        default_ttl_secs = settings.cache.default_ttl_secs,
        sweep_interval_secs = settings.cache.sweep_interval_secs,
        "Cache configuration loaded"
    );

    let backend: Arc<dyn DocumentStore> = match settings.cache.backend.kind {
        BackendKind::Memory => Arc::new(MemoryStore::new()),
        BackendKind::Sqlite => {
            let url = &settings.cache.backend.url;
            let store = SqliteStore::connect(url, &settings.cache.collection)
                .await
                .with_context(|| format!("failed to open sqlite backend at {}", url))?;
            Arc::new(store)
        },
    };

    let cache = CacheStore::open(backend, settings.cache_config()).await;
    let prometheus_handle = init_metrics().context("failed to install metrics recorder")?;

    // Scheduler and request-path trigger report to the same state
    let sweep_state = Arc::new(SweepState::new());
    let sweeps = SweepScheduler::new(
        cache.clone(),
        Arc::clone(&sweep_state),
        SweepConfig {
            interval: settings.sweep_interval(),
        },
    )
    .start();

    let state = AppState::new(cache, sweep_state, settings.sweep_interval());
    let app = create_router_with_state(state, prometheus_handle)
        .layer(cors_layer(&settings.server.cors_origins));

    run_server(addr, app).await?;

    sweeps.stop();
    tracing::info!("Stash Server stopped");

    Ok(())
}
