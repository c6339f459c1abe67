//! # Stash Store
//!
//! Best-effort TTL cache for expensive, read-mostly operations.
//!
//! This crate provides the cache store on top of a pluggable document
//! backend, transparent memoization of async and blocking operations, and
//! the sweeps that remove expired entries.
//!
//! ## Features
//!
//! - `DocumentStore` trait with in-memory (Moka) and SQLite (sqlx) backends
//! - Fingerprinted entries with per-call TTL, last write wins
//! - Async and blocking forms of every cache operation
//! - Failures are logged and swallowed; the cache never fails its caller
//! - Background and request-driven expiry sweeps
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stash_store::{CacheConfig, CacheStore, SqliteStore, SweepScheduler, SweepState};
//!
//! let backend = SqliteStore::connect("sqlite://cache.db", "cache_entries").await?;
//! let cache = CacheStore::open(Arc::new(backend), CacheConfig::default()).await;
//!
//! let handle = SweepScheduler::with_defaults(cache.clone(), Arc::new(SweepState::new())).start();
//! ```

pub mod cache;
pub mod document;
pub mod error;
pub mod memoize;
pub mod metrics;
pub mod runtime;
pub mod sweep;

// Re-exports
pub use cache::{CacheConfig, CacheStore, DEFAULT_TTL};
pub use document::{
    DEFAULT_COLLECTION, DeleteFilter, DocumentStore, IndexField, IndexSpec, MemoryStore,
    SqliteStore,
};
pub use error::StoreError;
pub use memoize::{CacheAware, Memoized, short_type_name};
pub use metrics::{CacheMetrics, CacheStats, register_cache_metrics};
pub use runtime::RuntimeBridge;
pub use sweep::{
    DEFAULT_SWEEP_INTERVAL, SweepConfig, SweepHandle, SweepScheduler, SweepSnapshot, SweepState,
    SweepTrigger, sweep_once,
};

// Re-export stash_core for consumers
pub use stash_core;
