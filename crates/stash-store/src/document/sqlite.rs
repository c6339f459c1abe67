//! Persistent document store on SQLite.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use stash_core::{CacheEntry, StoredValue};
use tokio::runtime::Handle;
use tracing::{debug, info};

use super::{DeleteFilter, DocumentStore, IndexSpec};
use crate::error::StoreError;

/// Stores cache documents in a SQLite table named after the collection.
///
/// Each document is one row: `key`, `data` as JSON text and `expires_at` as
/// Unix microseconds. Index names are global to a database, so a database
/// file holds a single cache collection.
///
/// The pool runs on Tokio. The runtime that opened the store is kept so
/// blocking cache calls made outside any runtime can still drive it.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    table: String,
    runtime: Option<Handle>,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and prepares the
    /// collection table.
    ///
    /// # Arguments
    /// * `url` - SQLite URL, e.g. `sqlite://cache.db` or `sqlite::memory:`
    /// * `collection` - table name; ASCII letters, digits and `_`
    pub async fn connect(url: &str, collection: &str) -> Result<Self, StoreError> {
        validate_collection(collection)?;

        let in_memory = url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::unavailable(format!("invalid database URL: {}", e)))?
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // An in-memory database lives and dies with its only connection
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        Self::with_pool(pool, collection).await
    }

    /// Uses an existing pool and prepares the collection table.
    pub async fn with_pool(pool: SqlitePool, collection: &str) -> Result<Self, StoreError> {
        validate_collection(collection)?;

        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                key TEXT NOT NULL PRIMARY KEY,
                data TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            collection
        );
        sqlx::query(&create).execute(&pool).await?;

        info!(collection = %collection, "SQLite cache collection ready");

        Ok(Self {
            pool,
            table: collection.to_string(),
            runtime: Handle::try_current().ok(),
        })
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn decode_row(&self, (key, data, expires_at): (String, String, i64)) -> Result<CacheEntry, StoreError> {
        let data: StoredValue = serde_json::from_str(&data)?;
        let expires_at = DateTime::<Utc>::from_timestamp_micros(expires_at).ok_or_else(|| {
            StoreError::query("find_live", format!("expires_at out of range: {}", expires_at))
        })?;
        Ok(CacheEntry {
            key,
            data,
            expires_at,
        })
    }
}

/// Collection names are interpolated into SQL, so only plain identifiers
/// are accepted.
fn validate_collection(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::invalid_collection(
            name,
            "must be an identifier of ASCII letters, digits and '_'",
        ));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        for spec in indexes {
            let unique = if spec.unique { "UNIQUE " } else { "" };
            let statement = format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                unique,
                spec.name,
                self.table,
                spec.field.as_str()
            );
            sqlx::query(&statement).execute(&self.pool).await?;
            debug!(index = spec.name, table = %self.table, "Index ensured");
        }
        Ok(())
    }

    async fn find_live(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, StoreError> {
        let query = format!(
            "SELECT key, data, expires_at FROM {} WHERE key = ? AND expires_at > ?",
            self.table
        );
        let row = sqlx::query_as::<_, (String, String, i64)>(&query)
            .bind(key)
            .bind(now.timestamp_micros())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| self.decode_row(row)).transpose()
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError> {
        let data = serde_json::to_string(&entry.data)?;
        let statement = format!(
            "INSERT INTO {} (key, data, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data, expires_at = excluded.expires_at",
            self.table
        );
        sqlx::query(&statement)
            .bind(&entry.key)
            .bind(data)
            .bind(entry.expires_at.timestamp_micros())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, filter: &DeleteFilter) -> Result<u64, StoreError> {
        let result = match filter {
            DeleteFilter::Key(key) => {
                sqlx::query(&format!("DELETE FROM {} WHERE key = ?", self.table))
                    .bind(key)
                    .execute(&self.pool)
                    .await?
            },
            DeleteFilter::KeyPrefix(prefix) => {
                // substr keeps '%' and '_' in keys literal, unlike LIKE
                sqlx::query(&format!(
                    "DELETE FROM {} WHERE substr(key, 1, length(?)) = ?",
                    self.table
                ))
                .bind(prefix)
                .bind(prefix)
                .execute(&self.pool)
                .await?
            },
            DeleteFilter::ExpiredAt(now) => {
                sqlx::query(&format!("DELETE FROM {} WHERE expires_at <= ?", self.table))
                    .bind(now.timestamp_micros())
                    .execute(&self.pool)
                    .await?
            },
            DeleteFilter::All => {
                sqlx::query(&format!("DELETE FROM {}", self.table))
                    .execute(&self.pool)
                    .await?
            },
        };
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }

    fn runtime(&self) -> Option<Handle> {
        self.runtime.clone()
    }

    fn requires_runtime(&self) -> bool {
        true
    }
}
