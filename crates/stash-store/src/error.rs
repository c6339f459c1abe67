//! Error types for document stores.

/// Errors that can occur when talking to a document store.
///
/// The cache layer never hands these to the operation it wraps; they are
/// logged at the cache boundary and the call degrades to a miss or a no-op.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A query or command was rejected by the store.
    #[error("query failed during {operation}: {reason}")]
    Query { operation: String, reason: String },

    /// A document could not be encoded or decoded.
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The collection name cannot be used by this store.
    #[error("invalid collection name '{name}': {reason}")]
    InvalidCollection { name: String, reason: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new query error.
    pub fn query(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new invalid collection error.
    pub fn invalid_collection(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCollection {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                Self::unavailable(err.to_string())
            },
            sqlx::Error::Io(io) => Self::Io(io),
            other => Self::query("sqlite", other.to_string()),
        }
    }
}
