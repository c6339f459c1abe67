//! Error types for Stash.
//!
//! This module defines the errors raised by the domain layer: payload
//! serialization, cached-value decoding, key construction and the
//! blocking bridge. All errors implement the standard
//! `std::error::Error` trait via `thiserror`.
//!
//! # Error Handling Philosophy
//!
//! The cache is best-effort. These errors are produced so that callers can
//! log them with full context, but the cache layer never surfaces them to
//! the business operation it wraps:
//! - Functions that can fail return `Result<T, StashError>`
//! - The store layer logs and swallows them at its boundary
//!
//! # Example
//!
//! ```
//! use stash_core::{Result, StashError};
//!
//! fn namespace_of(name: &str) -> Result<&str> {
//!     if name.is_empty() {
//!         return Err(StashError::invalid_key("", "namespace cannot be empty"));
//!     }
//!     Ok(name)
//! }
//!
//! assert!(namespace_of("NewsService").is_ok());
//! assert!(namespace_of("").unwrap_err().is_invalid_key());
//! ```

use thiserror::Error;

/// Main error type for Stash domain operations.
#[derive(Debug, Error)]
pub enum StashError {
    /// A value could not be converted into a storable document.
    #[error("Failed to serialize {type_name}: {message}")]
    Serialization {
        /// Rust type that was being serialized
        type_name: String,
        /// Description of the failure
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A cached document could not be turned back into the caller's type.
    #[error("Failed to decode cached value for '{key}': {message}")]
    Decode {
        /// Fingerprint of the entry
        key: String,
        /// Description of the failure
        message: String,
    },

    /// A cache key component is unusable.
    #[error("Invalid cache key component '{component}': {reason}")]
    InvalidKey {
        /// The offending component
        component: String,
        /// Why it's invalid
        reason: String,
    },

    /// A blocking cache call was made where it cannot be honoured.
    #[error("Blocking cache call refused: {0}")]
    BlockingContext(String),
}

impl StashError {
    /// Creates a Serialization error with a cause.
    pub fn serialization_with_cause<E>(
        type_name: impl Into<String>,
        message: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            type_name: type_name.into(),
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates a Decode error.
    pub fn decode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidKey error.
    pub fn invalid_key(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Creates a BlockingContext error.
    pub fn blocking_context(message: impl Into<String>) -> Self {
        Self::BlockingContext(message.into())
    }

    /// Returns true if this is an invalid key error.
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }

    /// Returns true if a blocking call was refused.
    pub fn is_blocking_context(&self) -> bool {
        matches!(self, Self::BlockingContext(_))
    }
}

/// Type alias for Results with StashError.
pub type Result<T> = std::result::Result<T, StashError>;
