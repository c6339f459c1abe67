//! Removal of expired cache entries.
//!
//! Two drivers share the same sweep:
//!
//! - [`SweepScheduler`] runs in the background on a fixed interval
//! - [`SweepTrigger`] is polled on the request path and fires a detached
//!   sweep once the interval has elapsed since the previous one

mod scheduler;
mod state;
mod trigger;

pub use scheduler::{SweepConfig, SweepHandle, SweepScheduler};
pub use state::{SweepSnapshot, SweepState};
pub use trigger::SweepTrigger;

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::cache::CacheStore;
use crate::error::StoreError;

/// Default time between two sweeps: one hour.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Removes expired entries once and records the outcome in `state`.
pub async fn sweep_once(cache: &CacheStore, state: &SweepState) -> Result<u64, StoreError> {
    info!("Starting cache sweep");
    let start = Instant::now();

    match cache.try_clear_expired().await {
        Ok(removed) => {
            state.record_success(removed, cache.clock().now());
            info!(
                removed,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Cache sweep completed"
            );
            Ok(removed)
        },
        Err(e) => {
            state.record_failure(e.to_string());
            error!(error = %e, "Cache sweep failed");
            Err(e)
        },
    }
}
