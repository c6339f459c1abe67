//! Transparent memoization of expensive operations.
//!
//! A service opts in by implementing [`CacheAware`] and wrapping the body of
//! an operation with a [`Memoized`] descriptor. The descriptor builds the
//! call fingerprint from the owner's namespace, the operation name and the
//! call arguments, answers from the cache on a hit, and computes and stores
//! the result on a miss.
//!
//! ```no_run
//! use std::time::Duration;
//! use serde::{Deserialize, Serialize};
//! use stash_core::cache_args;
//! use stash_store::{CacheAware, CacheStore, Memoized};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Headline { title: String }
//!
//! struct NewsService { cache: Option<CacheStore> }
//!
//! impl CacheAware for NewsService {
//!     fn cache_store(&self) -> Option<&CacheStore> {
//!         self.cache.as_ref()
//!     }
//! }
//!
//! static SEARCH: Memoized = Memoized::new("search").with_ttl(Duration::from_secs(3600));
//!
//! impl NewsService {
//!     async fn search(&self, company: &str) -> Vec<Headline> {
//!         SEARCH
//!             .call(self, cache_args!(company), || async {
//!                 vec![Headline { title: format!("{} beats estimates", company) }]
//!             })
//!             .await
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use stash_core::{CacheArgs, CacheKey, KeyPart, Payload, StashError, StoredValue};
use tracing::{debug, warn};

use crate::cache::CacheStore;

/// An owner of memoized operations.
///
/// The cache collaborator is optional: an owner that returns `None` from
/// [`cache_store`](Self::cache_store) runs every operation unmodified.
pub trait CacheAware {
    /// The cache to use, if any.
    fn cache_store(&self) -> Option<&CacheStore>;

    /// Namespace of this owner's entries. Defaults to the bare type name.
    fn cache_namespace(&self) -> Cow<'static, str> {
        Cow::Borrowed(short_type_name::<Self>())
    }
}

/// Returns the type name of `T` without module path or generic arguments.
///
/// ```
/// use stash_store::short_type_name;
///
/// assert_eq!(short_type_name::<Vec<String>>(), "Vec");
/// assert_eq!(short_type_name::<std::collections::HashMap<u8, u8>>(), "HashMap");
/// ```
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = match full.find('<') {
        Some(generics) => &full[..generics],
        None => full,
    };
    match base.rfind("::") {
        Some(separator) => &base[separator + 2..],
        None => base,
    }
}

/// Describes one memoized operation.
///
/// Meant to live in a `static` next to the operation it wraps.
#[derive(Debug, Clone, Copy)]
pub struct Memoized {
    operation: &'static str,
    params: &'static [&'static str],
    ttl: Option<Duration>,
}

impl Memoized {
    /// Memoizes the operation named `operation` with the default TTL.
    pub const fn new(operation: &'static str) -> Self {
        Self {
            operation,
            params: &[],
            ttl: None,
        }
    }

    /// Declares the parameter names used by [`bind`](Self::bind).
    pub const fn with_params(self, params: &'static [&'static str]) -> Self {
        Self { params, ..self }
    }

    /// Overrides the TTL of this operation's entries.
    pub const fn with_ttl(self, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..self
        }
    }

    /// Returns the operation name.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Returns the TTL override, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Binds call arguments against the declared parameter names.
    ///
    /// See [`CacheArgs::bind`].
    pub fn bind(&self, positional: &[&dyn KeyPart], named: &[(&str, &dyn KeyPart)]) -> CacheArgs {
        CacheArgs::bind(self.params, positional, named)
    }

    fn key<O: CacheAware + ?Sized>(&self, owner: &O, args: CacheArgs) -> CacheKey {
        CacheKey::new(owner.cache_namespace(), self.operation, args)
    }

    /// Runs an async operation through the cache.
    pub async fn call<O, T, F, Fut>(&self, owner: &O, args: CacheArgs, compute: F) -> T
    where
        O: CacheAware + ?Sized,
        T: Serialize + DeserializeOwned + Debug,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let Some(cache) = owner.cache_store() else {
            return compute().await;
        };
        let key = self.key(owner, args);

        if let Some(hit) = cached::<T>(cache, &key, cache.peek(&key).await) {
            return hit;
        }

        let value = compute().await;
        cache.store_value(&key, Payload::record(&value), self.ttl).await;
        value
    }

    /// Runs a fallible async operation through the cache.
    ///
    /// Errors are returned unchanged and never cached.
    pub async fn try_call<O, T, E, F, Fut>(
        &self,
        owner: &O,
        args: CacheArgs,
        compute: F,
    ) -> Result<T, E>
    where
        O: CacheAware + ?Sized,
        T: Serialize + DeserializeOwned + Debug,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(cache) = owner.cache_store() else {
            return compute().await;
        };
        let key = self.key(owner, args);

        if let Some(hit) = cached::<T>(cache, &key, cache.peek(&key).await) {
            return Ok(hit);
        }

        let value = compute().await?;
        cache.store_value(&key, Payload::record(&value), self.ttl).await;
        Ok(value)
    }

    /// Runs a blocking operation through the cache.
    pub fn call_blocking<O, T, F>(&self, owner: &O, args: CacheArgs, compute: F) -> T
    where
        O: CacheAware + ?Sized,
        T: Serialize + DeserializeOwned + Debug,
        F: FnOnce() -> T,
    {
        let Some(cache) = owner.cache_store() else {
            return compute();
        };
        let key = self.key(owner, args);

        let hit = cache
            .run_blocking("get", cache.peek(&key))
            .and_then(|stored| cached::<T>(cache, &key, stored));
        if let Some(hit) = hit {
            return hit;
        }

        let value = compute();
        cache.run_blocking("set", cache.store_value(&key, Payload::record(&value), self.ttl));
        value
    }

    /// Runs a fallible blocking operation through the cache.
    ///
    /// Errors are returned unchanged and never cached.
    pub fn try_call_blocking<O, T, E, F>(&self, owner: &O, args: CacheArgs, compute: F) -> Result<T, E>
    where
        O: CacheAware + ?Sized,
        T: Serialize + DeserializeOwned + Debug,
        F: FnOnce() -> Result<T, E>,
    {
        let Some(cache) = owner.cache_store() else {
            return compute();
        };
        let key = self.key(owner, args);

        let hit = cache
            .run_blocking("get", cache.peek(&key))
            .and_then(|stored| cached::<T>(cache, &key, stored));
        if let Some(hit) = hit {
            return Ok(hit);
        }

        let value = compute()?;
        cache.run_blocking("set", cache.store_value(&key, Payload::record(&value), self.ttl));
        Ok(value)
    }
}

/// Turns a cached document back into the result type and counts the
/// lookup. A document that no longer fits the type is logged and counted
/// as a miss.
fn cached<T: DeserializeOwned>(
    cache: &CacheStore,
    key: &CacheKey,
    stored: Option<StoredValue>,
) -> Option<T> {
    let decoded: Option<T> = stored.and_then(|stored| {
        match serde_json::from_value(stored.into_json()) {
            Ok(value) => {
                debug!(key = %key, "Serving memoized result");
                Some(value)
            },
            Err(e) => {
                let error = StashError::decode(key.fingerprint(), e.to_string());
                warn!(error = %error, "Cached value unusable, recomputing");
                None
            },
        }
    });
    cache.record_lookup(key, decoded.is_some());
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl CacheAware for Plain {
        fn cache_store(&self) -> Option<&CacheStore> {
            None
        }
    }

    #[allow(dead_code)]
    struct Generic<T>(T);

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Plain>(), "Plain");
        assert_eq!(short_type_name::<Generic<u8>>(), "Generic");
        assert_eq!(short_type_name::<str>(), "str");
    }

    #[test]
    fn test_default_namespace_is_type_name() {
        assert_eq!(Plain.cache_namespace(), "Plain");
    }

    #[test]
    fn test_const_builders() {
        const OP: Memoized = Memoized::new("search")
            .with_params(&["company", "year"])
            .with_ttl(Duration::from_secs(60));

        assert_eq!(OP.operation(), "search");
        assert_eq!(OP.ttl(), Some(Duration::from_secs(60)));
        assert_eq!(OP.bind(&[&"Acme"], &[]).to_string(), "company=Acme");
    }

    #[tokio::test]
    async fn test_no_cache_runs_operation() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let op = Memoized::new("count");
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let value: u32 = op
                .call(&Plain, CacheArgs::new(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    7
                })
                .await;
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
