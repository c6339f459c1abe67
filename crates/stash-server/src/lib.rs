//! Stash Server - HTTP admin surface for a Stash cache.
//!
//! Expone la cache sobre axum: inspeccion de entries, invalidacion por
//! llamada, operacion o namespace, sweep manual, health y metricas
//! Prometheus. Cada request pasa por el trigger de sweep.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use server::{cors_layer, create_router, create_router_with_state, run_server};
pub use settings::{BackendKind, Settings, SettingsError};
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
