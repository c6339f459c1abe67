#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stash_store::stash_core::{CacheEntry, ManualClock};
use stash_store::{
    CacheConfig, CacheStore, DeleteFilter, DocumentStore, IndexSpec, MemoryStore, StoreError,
};

/// A store whose every call fails, counting the attempts.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub calls: AtomicU32,
}

impl FailingStore {
    fn fail<T>(&self) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::unavailable("connection refused"))
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn ensure_indexes(&self, _indexes: &[IndexSpec]) -> Result<(), StoreError> {
        self.fail()
    }

    async fn find_live(
        &self,
        _key: &str,
        _now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, StoreError> {
        self.fail()
    }

    async fn upsert(&self, _entry: CacheEntry) -> Result<(), StoreError> {
        self.fail()
    }

    async fn delete(&self, _filter: &DeleteFilter) -> Result<u64, StoreError> {
        self.fail()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.fail()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.fail()
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// An in-memory cache driven by a manual clock.
pub fn memory_cache() -> (CacheStore, ManualClock) {
    let clock = ManualClock::default();
    let cache = CacheStore::new(Arc::new(MemoryStore::new()), CacheConfig::default())
        .with_clock(Arc::new(clock.clone()));
    (cache, clock)
}
