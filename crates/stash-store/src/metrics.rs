//! Cache metrics recording.

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Describes the cache metrics to the installed recorder.
/// Call once at startup, after the exporter is installed.
pub fn register_cache_metrics() {
    metrics::describe_counter!("stash_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!("stash_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!("stash_cache_writes_total", "Total number of cache writes");
    metrics::describe_counter!(
        "stash_cache_evictions_total",
        "Total number of cache documents removed, by reason"
    );
    metrics::describe_gauge!("stash_cache_entries", "Number of stored cache documents");
    metrics::describe_histogram!(
        "stash_cache_operation_seconds",
        "Time spent on cache operations"
    );
}

/// Counters kept by a cache store.
///
/// Backed by atomics for the in-process view and mirrored to the `metrics`
/// facade for export. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
    failures: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("stash_cache_hits_total").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("stash_cache_misses_total").increment(1);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        counter!("stash_cache_writes_total").increment(1);
    }

    /// Counts a store call that failed and was swallowed.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records documents removed, labelled `invalidate`, `clear` or `expired`.
    pub fn record_evictions(&self, reason: &'static str, count: u64) {
        if count > 0 {
            counter!("stash_cache_evictions_total", "reason" => reason).increment(count);
        }
    }

    pub fn update_entry_count(&self, count: u64) {
        gauge!("stash_cache_entries").set(count as f64);
    }

    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        histogram!("stash_cache_operation_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }

    /// Hits over lookups, 0 when nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes(),
            failures: self.failures(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Snapshot of [`CacheMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub failures: u64,
    pub hit_rate: f64,
}
