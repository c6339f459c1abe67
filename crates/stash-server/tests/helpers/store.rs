//! Backends de prueba.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stash_store::stash_core::CacheEntry;
use stash_store::{DeleteFilter, DocumentStore, IndexSpec, StoreError};

/// Backend que falla en toda llamada.
#[derive(Debug)]
pub struct FailingStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::unavailable("connection refused"))
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn ensure_indexes(&self, _indexes: &[IndexSpec]) -> Result<(), StoreError> {
        down()
    }

    async fn find_live(
        &self,
        _key: &str,
        _now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, StoreError> {
        down()
    }

    async fn upsert(&self, _entry: CacheEntry) -> Result<(), StoreError> {
        down()
    }

    async fn delete(&self, _filter: &DeleteFilter) -> Result<u64, StoreError> {
        down()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        down()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        down()
    }

    fn name(&self) -> &str {
        "failing"
    }
}
