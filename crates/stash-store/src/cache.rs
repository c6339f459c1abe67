//! The cache store: TTL entries keyed by call fingerprint.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use stash_core::{
    CacheArgs, CacheEntry, CacheKey, Clock, Payload, StoredValue, SystemClock, serialize,
};
use tracing::{debug, info, warn};

use crate::document::{DeleteFilter, DocumentStore, IndexSpec};
use crate::error::StoreError;
use crate::metrics::{CacheMetrics, CacheStats};
use crate::runtime::RuntimeBridge;

/// Default lifetime of a cache entry: one day.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration of a cache store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of entries written without an explicit TTL.
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
        }
    }
}

/// Best-effort TTL cache over a [`DocumentStore`].
///
/// Every operation comes in an async form and a `*_blocking` form with the
/// same behavior. No operation fails its caller: store errors are logged and
/// a failed lookup reads as a miss, a failed write or delete as a no-op.
///
/// Clones share the backend, the clock and the counters.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use stash_core::cache_args;
/// use stash_store::{CacheConfig, CacheStore, MemoryStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = CacheStore::open(Arc::new(MemoryStore::new()), CacheConfig::default()).await;
/// let args = cache_args!(x = 1);
///
/// cache.set("Svc", "op", &args, 42i64, Some(Duration::from_secs(60))).await;
/// assert_eq!(cache.get("Svc", "op", &args).await.and_then(|v| v.as_i64()), Some(42));
/// # }
/// ```
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn DocumentStore>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    metrics: CacheMetrics,
    bridge: RuntimeBridge,
}

impl CacheStore {
    /// Creates a cache over `store` without touching it.
    ///
    /// Captures the current Tokio runtime, or else the runtime the store is
    /// bound to, for blocking calls made later from outside a runtime.
    pub fn new(store: Arc<dyn DocumentStore>, config: CacheConfig) -> Self {
        let bridge = RuntimeBridge::capture()
            .or_handle(store.runtime())
            .requiring_runtime(store.requires_runtime());
        Self {
            store,
            config,
            clock: Arc::new(SystemClock),
            metrics: CacheMetrics::new(),
            bridge,
        }
    }

    /// Creates a cache and makes sure the collection carries its indexes.
    pub async fn open(store: Arc<dyn DocumentStore>, config: CacheConfig) -> Self {
        let cache = Self::new(store, config);
        cache.initialize().await;
        cache
    }

    /// Uses `clock` for every expiry decision.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses `bridge` for blocking calls and background work.
    pub fn with_bridge(mut self, bridge: RuntimeBridge) -> Self {
        self.bridge = bridge;
        self
    }

    /// Ensures the key and expiry indexes exist. Safe to call repeatedly.
    pub async fn initialize(&self) {
        match self.store.ensure_indexes(&IndexSpec::cache_indexes()).await {
            Ok(()) => info!(backend = self.store.name(), "Cache indexes ready"),
            Err(e) => warn!(
                error = %e,
                backend = self.store.name(),
                "Failed to ensure cache indexes"
            ),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the clock used for expiry.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the runtime bridge.
    pub fn bridge(&self) -> &RuntimeBridge {
        &self.bridge
    }

    /// Returns the counters.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Name of the backing store.
    pub fn backend_name(&self) -> &str {
        self.store.name()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ==========================================
    // Async operations
    // ==========================================

    /// Returns the live value cached for the call, if any.
    pub async fn get(
        &self,
        namespace: &str,
        operation: &str,
        args: &CacheArgs,
    ) -> Option<StoredValue> {
        self.lookup(&CacheKey::new(namespace, operation, args.clone()))
            .await
    }

    /// Returns the live value cached under `key`, if any, and counts the
    /// outcome as a hit or a miss.
    pub async fn lookup(&self, key: &CacheKey) -> Option<StoredValue> {
        let result = self.peek(key).await;
        self.record_lookup(key, result.is_some());
        result
    }

    /// Reads the live value under `key` without touching the hit and miss
    /// counters. Store failures are still counted and read as `None`.
    pub async fn peek(&self, key: &CacheKey) -> Option<StoredValue> {
        let start = Instant::now();
        let fingerprint = key.fingerprint();

        let result = match self.store.find_live(&fingerprint, self.now()).await {
            Ok(found) => found.map(|entry| entry.data),
            Err(e) => {
                self.metrics.record_failure();
                warn!(key = %fingerprint, error = %e, "Cache lookup failed, treating as miss");
                None
            },
        };
        self.metrics
            .record_operation_duration("get", start.elapsed());

        result
    }

    pub(crate) fn record_lookup(&self, key: &CacheKey, hit: bool) {
        if hit {
            self.metrics.record_hit();
            debug!(key = %key, "Cache hit");
        } else {
            self.metrics.record_miss();
            debug!(key = %key, "Cache miss");
        }
    }

    /// Stores `value` for the call, replacing any previous entry.
    ///
    /// The entry expires after `ttl`, or after the configured default TTL
    /// when `None`.
    pub async fn set(
        &self,
        namespace: &str,
        operation: &str,
        args: &CacheArgs,
        value: impl Into<Payload>,
        ttl: Option<Duration>,
    ) {
        self.store_value(&CacheKey::new(namespace, operation, args.clone()), value, ttl)
            .await
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub async fn store_value(
        &self,
        key: &CacheKey,
        value: impl Into<Payload>,
        ttl: Option<Duration>,
    ) {
        let start = Instant::now();
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry {
            key: key.fingerprint(),
            data: serialize(value.into()),
            expires_at: expiry(self.now(), ttl),
        };
        let fingerprint = entry.key.clone();

        match self.store.upsert(entry).await {
            Ok(()) => {
                self.metrics.record_write();
                info!(key = %fingerprint, ttl_secs = ttl.as_secs(), "Cache entry stored");
            },
            Err(e) => {
                self.metrics.record_failure();
                warn!(key = %fingerprint, error = %e, "Cache write failed");
            },
        }
        self.metrics
            .record_operation_duration("set", start.elapsed());
    }

    /// Removes the entry of one call. Removing a missing entry is a no-op.
    pub async fn invalidate(&self, namespace: &str, operation: &str, args: &CacheArgs) -> u64 {
        let key = CacheKey::new(namespace, operation, args.clone());
        self.remove(DeleteFilter::Key(key.fingerprint()), "invalidate")
            .await
    }

    /// Removes every entry of one operation.
    pub async fn invalidate_operation(&self, namespace: &str, operation: &str) -> u64 {
        let prefix = CacheKey::operation_prefix(namespace, operation);
        self.remove(DeleteFilter::KeyPrefix(prefix), "invalidate")
            .await
    }

    /// Removes every entry of one namespace.
    pub async fn invalidate_namespace(&self, namespace: &str) -> u64 {
        let prefix = CacheKey::namespace_prefix(namespace);
        self.remove(DeleteFilter::KeyPrefix(prefix), "invalidate")
            .await
    }

    /// Removes every entry.
    pub async fn clear_all(&self) -> u64 {
        self.remove(DeleteFilter::All, "clear").await
    }

    /// Removes every entry whose expiry instant has been reached.
    pub async fn clear_expired(&self) -> u64 {
        self.remove(DeleteFilter::ExpiredAt(self.now()), "expired")
            .await
    }

    /// Like [`clear_expired`](Self::clear_expired), but reports a store
    /// failure instead of logging it.
    pub async fn try_clear_expired(&self) -> Result<u64, StoreError> {
        let start = Instant::now();
        let removed = self
            .store
            .delete(&DeleteFilter::ExpiredAt(self.now()))
            .await?;
        self.metrics.record_evictions("expired", removed);
        self.metrics
            .record_operation_duration("clear_expired", start.elapsed());
        Ok(removed)
    }

    /// Number of stored documents, expired ones included.
    pub async fn entry_count(&self) -> Option<u64> {
        match self.store.count().await {
            Ok(count) => {
                self.metrics.update_entry_count(count);
                Some(count)
            },
            Err(e) => {
                warn!(error = %e, "Failed to count cache entries");
                None
            },
        }
    }

    /// Checks the backing store.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }

    async fn remove(&self, filter: DeleteFilter, reason: &'static str) -> u64 {
        let start = Instant::now();
        let removed = match self.store.delete(&filter).await {
            Ok(removed) => {
                info!(filter = ?filter, removed, "Cache entries removed");
                removed
            },
            Err(e) => {
                self.metrics.record_failure();
                warn!(filter = ?filter, error = %e, "Cache delete failed");
                0
            },
        };
        self.metrics.record_evictions(reason, removed);
        self.metrics
            .record_operation_duration(reason, start.elapsed());
        removed
    }

    // ==========================================
    // Blocking operations
    // ==========================================

    /// Blocking form of [`get`](Self::get).
    pub fn get_blocking(
        &self,
        namespace: &str,
        operation: &str,
        args: &CacheArgs,
    ) -> Option<StoredValue> {
        self.run_blocking("get", self.get(namespace, operation, args))
            .flatten()
    }

    /// Blocking form of [`set`](Self::set).
    pub fn set_blocking(
        &self,
        namespace: &str,
        operation: &str,
        args: &CacheArgs,
        value: impl Into<Payload>,
        ttl: Option<Duration>,
    ) {
        self.run_blocking("set", self.set(namespace, operation, args, value, ttl));
    }

    /// Blocking form of [`invalidate`](Self::invalidate).
    pub fn invalidate_blocking(&self, namespace: &str, operation: &str, args: &CacheArgs) -> u64 {
        self.run_blocking("invalidate", self.invalidate(namespace, operation, args))
            .unwrap_or(0)
    }

    /// Blocking form of [`clear_all`](Self::clear_all).
    pub fn clear_all_blocking(&self) -> u64 {
        self.run_blocking("clear_all", self.clear_all())
            .unwrap_or(0)
    }

    /// Blocking form of [`clear_expired`](Self::clear_expired).
    pub fn clear_expired_blocking(&self) -> u64 {
        self.run_blocking("clear_expired", self.clear_expired())
            .unwrap_or(0)
    }

    /// Runs a cache future from blocking code. A refused call is logged and
    /// yields `None`, which callers read as a miss or a no-op.
    pub(crate) fn run_blocking<F: Future>(&self, operation: &str, future: F) -> Option<F::Output> {
        match self.bridge.block_on(future) {
            Ok(output) => Some(output),
            Err(e) => {
                self.metrics.record_failure();
                warn!(operation, error = %e, "Blocking cache call skipped");
                None
            },
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.store.name())
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish()
    }
}

/// `now + ttl`, saturating at the largest representable instant.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
