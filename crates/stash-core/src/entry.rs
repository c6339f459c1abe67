use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value::StoredValue;

/// The persisted cache document.
///
/// At most one live document exists per `key`; writes replace `data` and
/// `expires_at` of the existing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Fingerprint of the cached call.
    pub key: String,
    /// Serialized result.
    pub data: StoredValue,
    /// Instant after which the entry is no longer served.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(key: impl Into<String>, data: StoredValue, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            data,
            expires_at: now + ttl,
        }
    }

    /// True while `expires_at` lies strictly after `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// True once `expires_at` has been reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_live_at(now)
    }
}
