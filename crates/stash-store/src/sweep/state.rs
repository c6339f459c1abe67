//! Expiry sweep state tracking.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Outcome history of the expiry sweeps of one cache.
#[derive(Debug, Default)]
pub struct SweepState {
    inner: RwLock<SweepSnapshot>,
}

/// Point-in-time copy of a [`SweepState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSnapshot {
    /// When the last successful sweep finished.
    pub last_sweep: Option<DateTime<Utc>>,
    /// Documents removed by the last successful sweep.
    pub last_removed: u64,
    /// Documents removed by all sweeps so far.
    pub total_removed: u64,
    /// Number of successful sweeps.
    pub sweeps: u64,
    /// Message of the last failure, cleared by the next success.
    pub last_error: Option<String>,
    /// Number of consecutive failures.
    pub failure_count: u32,
}

impl SweepState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful sweep.
    pub fn record_success(&self, removed: u64, at: DateTime<Utc>) {
        let mut inner = self.inner.write();
        inner.last_sweep = Some(at);
        inner.last_removed = removed;
        inner.total_removed += removed;
        inner.sweeps += 1;
        inner.last_error = None;
        inner.failure_count = 0;
    }

    /// Records a failed sweep.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.last_error = Some(error.into());
        inner.failure_count += 1;
    }

    /// Returns when the last successful sweep finished.
    pub fn last_sweep(&self) -> Option<DateTime<Utc>> {
        self.inner.read().last_sweep
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    /// Returns the number of consecutive failures.
    pub fn failure_count(&self) -> u32 {
        self.inner.read().failure_count
    }

    /// Returns true unless the last sweep failed.
    pub fn is_healthy(&self) -> bool {
        self.inner.read().last_error.is_none()
    }

    /// Copies the current state.
    pub fn snapshot(&self) -> SweepSnapshot {
        self.inner.read().clone()
    }
}
