//! Application state.

use std::sync::Arc;
use std::time::Duration;

use stash_store::{CacheStore, SweepState, SweepTrigger};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache being administered.
    cache: CacheStore,
    /// Request-path sweep trigger, sharing its state with the scheduler.
    trigger: Arc<SweepTrigger>,
}

impl AppState {
    /// Creates an AppState whose sweeps run at most once per `sweep_interval`.
    pub fn new(cache: CacheStore, sweep_state: Arc<SweepState>, sweep_interval: Duration) -> Self {
        let trigger = SweepTrigger::new(cache.clone(), sweep_state, sweep_interval);
        Self {
            cache,
            trigger: Arc::new(trigger),
        }
    }

    /// Creates an AppState with the default sweep interval.
    pub fn with_defaults(cache: CacheStore) -> Self {
        let trigger = SweepTrigger::with_defaults(cache.clone(), Arc::new(SweepState::new()));
        Self {
            cache,
            trigger: Arc::new(trigger),
        }
    }

    /// Returns the cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Returns the request-path sweep trigger.
    pub fn trigger(&self) -> &Arc<SweepTrigger> {
        &self.trigger
    }

    /// Returns the sweep state.
    pub fn sweep_state(&self) -> &Arc<SweepState> {
        self.trigger.state()
    }
}
