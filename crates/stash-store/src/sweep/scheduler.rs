//! Background sweep scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info};

use super::{DEFAULT_SWEEP_INTERVAL, SweepState, sweep_once};
use crate::cache::CacheStore;
use crate::error::StoreError;

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Interval between sweeps.
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Handle for controlling a running sweep scheduler.
///
/// Dropping the handle stops the scheduler.
pub struct SweepHandle {
    /// Sender to signal shutdown.
    shutdown_tx: watch::Sender<bool>,
}

impl SweepHandle {
    /// Signals the scheduler to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Periodically removes expired entries from a cache.
pub struct SweepScheduler {
    cache: CacheStore,
    state: Arc<SweepState>,
    config: SweepConfig,
}

impl SweepScheduler {
    /// Creates a new sweep scheduler.
    pub fn new(cache: CacheStore, state: Arc<SweepState>, config: SweepConfig) -> Self {
        Self {
            cache,
            state,
            config,
        }
    }

    /// Creates a scheduler with default configuration.
    pub fn with_defaults(cache: CacheStore, state: Arc<SweepState>) -> Self {
        Self::new(cache, state, SweepConfig::default())
    }

    /// Starts the background sweep task on the current runtime.
    ///
    /// The first sweep runs one interval after start. Returns a handle that
    /// stops the scheduler.
    pub fn start(self) -> SweepHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = SweepHandle { shutdown_tx };

        tokio::spawn(self.run(shutdown_rx));

        handle
    }

    /// Runs the scheduler loop.
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);

        info!("Starting sweep scheduler with interval {:?}", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Scheduled sweep due");
                    // failures are recorded in the state and logged
                    let _ = sweep_once(&self.cache, &self.state).await;
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Sweep scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Runs one sweep right away.
    pub async fn trigger_sweep(&self) -> Result<u64, StoreError> {
        info!("Manual sweep triggered");
        sweep_once(&self.cache, &self.state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::document::MemoryStore;
    use stash_core::cache_args;

    #[test]
    fn test_sweep_config_default() {
        let config = SweepConfig::default();
        assert_eq!(config.interval, Duration::from_secs(3600));
    }

    #[test]
    fn test_sweep_handle_stop() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = SweepHandle { shutdown_tx };

        assert!(!*shutdown_rx.borrow());
        handle.stop();
        assert!(*shutdown_rx.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_sweeps_on_interval() {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()), CacheConfig::default());
        cache
            .set("Svc", "op", &cache_args!(), 1i64, Some(Duration::ZERO))
            .await;

        let state = Arc::new(SweepState::new());
        let config = SweepConfig {
            interval: Duration::from_secs(60),
        };
        let handle = SweepScheduler::new(cache.clone(), Arc::clone(&state), config).start();

        // nothing before the first interval elapses
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(state.snapshot().sweeps, 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(state.snapshot().sweeps, 1);
        assert_eq!(state.snapshot().total_removed, 1);

        handle.stop();
    }

    #[tokio::test]
    async fn test_trigger_sweep() {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()), CacheConfig::default());
        let state = Arc::new(SweepState::new());
        let scheduler = SweepScheduler::with_defaults(cache, Arc::clone(&state));

        assert_eq!(scheduler.trigger_sweep().await.unwrap(), 0);
        assert!(state.last_sweep().is_some());
    }
}
