//! In-process document store backed by Moka.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use parking_lot::RwLock;
use stash_core::CacheEntry;
use tracing::debug;

use super::{DeleteFilter, DocumentStore, IndexSpec};
use crate::error::StoreError;

/// Keeps cache documents in memory.
///
/// The underlying Moka cache is unbounded and never expires documents by
/// itself; expired documents stay until the cache layer sweeps them, the
/// same as with a persistent store. Clones share the same documents.
#[derive(Clone)]
pub struct MemoryStore {
    documents: Cache<String, CacheEntry>,
    indexes: std::sync::Arc<RwLock<Vec<IndexSpec>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            documents: Cache::builder().build(),
            indexes: Default::default(),
        }
    }

    /// Returns the index specs registered so far.
    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.indexes.read().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.documents.entry_count())
            .field("indexes", &self.indexes.read().len())
            .finish()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        let mut registered = self.indexes.write();
        for spec in indexes {
            if registered.iter().any(|existing| existing.name == spec.name) {
                debug!(index = spec.name, "Index already present");
                continue;
            }
            registered.push(spec.clone());
        }
        Ok(())
    }

    async fn find_live(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self
            .documents
            .get(key)
            .await
            .filter(|entry| entry.is_live_at(now)))
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError> {
        self.documents.insert(entry.key.clone(), entry).await;
        Ok(())
    }

    async fn delete(&self, filter: &DeleteFilter) -> Result<u64, StoreError> {
        if let DeleteFilter::Key(key) = filter {
            return Ok(self.documents.remove(key).await.map_or(0, |_| 1));
        }

        // Snapshot first; documents may change during iteration
        let selected: Vec<String> = self
            .documents
            .iter()
            .filter(|(_, entry)| filter.matches(entry))
            .map(|(key, _)| (*key).clone())
            .collect();

        let mut removed = 0;
        for key in selected {
            if self.documents.remove(&key).await.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.documents.run_pending_tasks().await;
        Ok(self.documents.entry_count())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
