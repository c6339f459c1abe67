//! Cache key fingerprints.

use std::fmt;

use super::args::CacheArgs;
use crate::error::{Result, StashError};

/// Identity of a cached call: owner namespace, operation name and arguments.
///
/// Its `Display` form is the fingerprint stored in the document's `key`
/// field: `{namespace}:{operation}:{k1=v1&k2=v2...}` with arguments sorted
/// by name.
///
/// # Example
///
/// ```
/// use stash_core::{CacheArgs, CacheKey};
///
/// let args = CacheArgs::new().with("x", &1);
/// let key = CacheKey::new("Svc", "op", args);
///
/// assert_eq!(key.to_string(), "Svc:op:x=1");
/// assert!(key.to_string().starts_with(&CacheKey::operation_prefix("Svc", "op")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    operation: String,
    args: CacheArgs,
}

impl CacheKey {
    /// Creates a key. Components are taken as given.
    pub fn new(namespace: impl Into<String>, operation: impl Into<String>, args: CacheArgs) -> Self {
        Self {
            namespace: namespace.into(),
            operation: operation.into(),
            args,
        }
    }

    /// Creates a key from externally supplied components, rejecting empty
    /// ones and ones containing the `:` separator.
    pub fn checked(
        namespace: impl Into<String>,
        operation: impl Into<String>,
        args: CacheArgs,
    ) -> Result<Self> {
        let namespace = namespace.into();
        let operation = operation.into();
        validate_component(&namespace)?;
        validate_component(&operation)?;
        Ok(Self::new(namespace, operation, args))
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the operation name.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the argument map.
    pub fn args(&self) -> &CacheArgs {
        &self.args
    }

    /// Returns the fingerprint.
    pub fn fingerprint(&self) -> String {
        self.to_string()
    }

    /// Prefix shared by every key of a namespace.
    pub fn namespace_prefix(namespace: &str) -> String {
        format!("{}:", namespace)
    }

    /// Prefix shared by every key of one operation.
    pub fn operation_prefix(namespace: &str, operation: &str) -> String {
        format!("{}:{}:", namespace, operation)
    }
}

/// Checks a namespace or operation name coming from outside the process.
pub fn validate_component(component: &str) -> Result<()> {
    if component.is_empty() {
        return Err(StashError::invalid_key(component, "cannot be empty"));
    }
    if component.contains(':') {
        return Err(StashError::invalid_key(component, "cannot contain ':'"));
    }
    Ok(())
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.operation, self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_layout() {
        let args = CacheArgs::new().with("company", &"Acme").with("year", &2024);
        let key = CacheKey::new("NewsService", "search", args);

        assert_eq!(key.fingerprint(), "NewsService:search:company=Acme&year=2024");
    }

    #[test]
    fn test_empty_args_keep_trailing_separator() {
        let key = CacheKey::new("Svc", "list", CacheArgs::new());

        assert_eq!(key.to_string(), "Svc:list:");
    }

    #[test]
    fn test_key_accessors() {
        let key = CacheKey::new("Svc", "op", CacheArgs::new().with("x", &"1"));

        assert_eq!(key.namespace(), "Svc");
        assert_eq!(key.operation(), "op");
        assert_eq!(key.args().get("x"), Some("1"));
    }

    #[test]
    fn test_key_hash() {
        use std::collections::HashSet;

        let key1 = CacheKey::new("Svc", "op", CacheArgs::new().with("a", &1).with("b", &2));
        let key2 = CacheKey::new("Svc", "op", CacheArgs::new().with("b", &2).with("a", &1));

        let mut set = HashSet::new();
        set.insert(key1);

        assert!(set.contains(&key2));
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(CacheKey::namespace_prefix("Svc"), "Svc:");
        assert_eq!(CacheKey::operation_prefix("Svc", "op"), "Svc:op:");
    }

    #[test]
    fn test_checked_rejects_bad_components() {
        assert!(CacheKey::checked("Svc", "op", CacheArgs::new()).is_ok());
        assert!(CacheKey::checked("", "op", CacheArgs::new()).unwrap_err().is_invalid_key());
        assert!(CacheKey::checked("Svc", "a:b", CacheArgs::new()).unwrap_err().is_invalid_key());
    }
}
