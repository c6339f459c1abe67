//! Stash Core - Domain types for the cache layer
//!
//! This crate provides the building blocks shared by the store and the
//! server: the stored value tree, the payload serializer, cache key
//! fingerprints, the cache document and time sources.

pub mod clock;
pub mod entry;
pub mod error;
pub mod key;
pub mod serialize;
pub mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use error::{Result, StashError};
pub use key::{CacheArgs, CacheKey, KeyPart};
pub use serialize::{Payload, Record, serialize};
pub use value::StoredValue;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
