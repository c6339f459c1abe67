//! Cache key construction.
//!
//! A key is built from the owner's namespace, the operation name and the
//! call arguments. Argument values are turned into strings through
//! [`KeyPart`] and kept sorted by name in [`CacheArgs`], so the fingerprint
//! depends only on which values were passed, not on how.

mod args;
mod fingerprint;
mod part;

pub use args::CacheArgs;
pub use fingerprint::{CacheKey, validate_component};
pub use part::KeyPart;
