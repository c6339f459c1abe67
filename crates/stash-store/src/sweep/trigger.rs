//! Request-path sweep trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::debug;

use super::{DEFAULT_SWEEP_INTERVAL, SweepState, sweep_once};
use crate::cache::CacheStore;

/// Fires a detached sweep when enough time has passed since the last one.
///
/// Meant to be polled on every inbound request. Polling never waits for the
/// sweep: the sweep runs as a separate task and its failures only reach the
/// log and the [`SweepState`].
#[derive(Debug)]
pub struct SweepTrigger {
    cache: CacheStore,
    state: Arc<SweepState>,
    interval: TimeDelta,
    last_sweep: Mutex<DateTime<Utc>>,
}

impl SweepTrigger {
    /// Creates a trigger whose first sweep is due one `interval` from now.
    pub fn new(cache: CacheStore, state: Arc<SweepState>, interval: Duration) -> Self {
        let now = cache.clock().now();
        Self {
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
            last_sweep: Mutex::new(now),
            cache,
            state,
        }
    }

    /// Creates a trigger with the default one-hour interval.
    pub fn with_defaults(cache: CacheStore, state: Arc<SweepState>) -> Self {
        Self::new(cache, state, DEFAULT_SWEEP_INTERVAL)
    }

    /// Returns the sweep state shared with the spawned sweeps.
    pub fn state(&self) -> &Arc<SweepState> {
        &self.state
    }

    /// Spawns a sweep if more than the interval elapsed since the last one.
    ///
    /// The timestamp is moved forward before the sweep starts, so concurrent
    /// callers spawn at most one sweep per interval. Returns whether a sweep
    /// was spawned.
    pub fn maybe_sweep(&self) -> bool {
        let now = self.cache.clock().now();
        {
            let mut last = self.last_sweep.lock();
            if now - *last <= self.interval {
                return false;
            }
            *last = now;
        }

        debug!("Sweep interval elapsed, spawning sweep");
        let cache = self.cache.clone();
        let state = Arc::clone(&self.state);
        self.cache.bridge().spawn(async move {
            let _ = sweep_once(&cache, &state).await;
        })
    }
}
