//! Document store abstraction.
//!
//! The cache persists one [`CacheEntry`] document per fingerprint. This
//! module defines the primitives the cache needs from a backing store and
//! ships two implementations:
//!
//! - [`MemoryStore`] keeps documents in process
//! - [`SqliteStore`] persists them in a SQLite database

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stash_core::CacheEntry;
use tokio::runtime::Handle;

use crate::error::StoreError;

/// Name of the unique index on the document key.
pub const KEY_INDEX: &str = "key_index";

/// Name of the index on the expiry instant.
pub const EXPIRY_INDEX: &str = "expiry_index";

/// Default collection holding cache documents.
pub const DEFAULT_COLLECTION: &str = "cache_entries";

/// Document field an index is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexField {
    /// The `key` field.
    Key,
    /// The `expires_at` field.
    ExpiresAt,
}

impl IndexField {
    /// Field name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::ExpiresAt => "expires_at",
        }
    }
}

/// An index the cache requires on its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    /// Index name.
    pub name: &'static str,
    /// Indexed field.
    pub field: IndexField,
    /// Whether values must be unique.
    pub unique: bool,
}

impl IndexSpec {
    /// The indexes every cache collection carries.
    pub fn cache_indexes() -> [IndexSpec; 2] {
        [
            IndexSpec {
                name: KEY_INDEX,
                field: IndexField::Key,
                unique: true,
            },
            IndexSpec {
                name: EXPIRY_INDEX,
                field: IndexField::ExpiresAt,
                unique: false,
            },
        ]
    }
}

/// Selects the documents removed by [`DocumentStore::delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteFilter {
    /// The document with exactly this key.
    Key(String),
    /// Every document whose key starts with this prefix.
    KeyPrefix(String),
    /// Every document with `expires_at <= t`.
    ExpiredAt(DateTime<Utc>),
    /// Every document.
    All,
}

impl DeleteFilter {
    /// Returns true if the document is selected by this filter.
    pub fn matches(&self, entry: &CacheEntry) -> bool {
        match self {
            Self::Key(key) => entry.key == *key,
            Self::KeyPrefix(prefix) => entry.key.starts_with(prefix.as_str()),
            Self::ExpiredAt(now) => entry.is_expired_at(*now),
            Self::All => true,
        }
    }
}

/// A store of cache documents.
///
/// Implementations only move documents in and out; expiry semantics live in
/// the cache layer, which passes the current instant explicitly.
///
/// # Example
///
/// ```ignore
/// use stash_store::{DocumentStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.ensure_indexes(&IndexSpec::cache_indexes()).await?;
/// store.upsert(entry).await?;
/// let live = store.find_live("Svc:op:x=1", Utc::now()).await?;
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates the given indexes if they don't exist yet.
    ///
    /// Calling it again with the same specs is a no-op.
    async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError>;

    /// Returns the document with this key if it is still live at `now`.
    async fn find_live(&self, key: &str, now: DateTime<Utc>)
    -> Result<Option<CacheEntry>, StoreError>;

    /// Inserts the document, or replaces `data` and `expires_at` of the
    /// document with the same key.
    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError>;

    /// Removes the selected documents and returns how many were removed.
    async fn delete(&self, filter: &DeleteFilter) -> Result<u64, StoreError>;

    /// Returns the number of stored documents, live or not.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Verifies the store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Returns the name of this store, for logging.
    fn name(&self) -> &str;

    /// Runtime the store's futures are bound to, if any. Blocking callers
    /// outside any runtime drive the cache on it.
    fn runtime(&self) -> Option<Handle> {
        None
    }

    /// Whether the store's futures must be polled inside a Tokio context.
    fn requires_runtime(&self) -> bool {
        false
    }
}
