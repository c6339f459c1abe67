//! Named call arguments, kept in canonical order.

use std::collections::BTreeMap;
use std::fmt;

use super::part::KeyPart;

/// The argument map of a cached call.
///
/// Names map to the string form of each value. Entries are kept sorted by
/// name, so two maps built from the same pairs in any order render to the
/// same fingerprint segment.
///
/// # Example
///
/// ```
/// use stash_core::CacheArgs;
///
/// let mut a = CacheArgs::new();
/// a.insert("year", &2024);
/// a.insert("company", &"Acme");
///
/// let mut b = CacheArgs::new();
/// b.insert("company", &"Acme");
/// b.insert("year", &2024);
///
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "company=Acme&year=2024");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CacheArgs {
    entries: BTreeMap<String, String>,
}

impl CacheArgs {
    /// Creates an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument. Values without a key part are skipped, and an
    /// existing entry under the same name is replaced.
    pub fn insert<T>(&mut self, name: impl Into<String>, value: &T) -> &mut Self
    where
        T: KeyPart + ?Sized,
    {
        let name = name.into();
        match value.key_part() {
            Some(part) => {
                self.entries.insert(name, part);
            },
            None => {
                self.entries.remove(&name);
            },
        }
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<T>(mut self, name: impl Into<String>, value: &T) -> Self
    where
        T: KeyPart + ?Sized,
    {
        self.insert(name, value);
        self
    }

    /// Binds call arguments to parameter names.
    ///
    /// Positional values take the declared name at their index, then named
    /// values are applied under their own names. A positional value past the
    /// end of `params` is recorded as `_<index>` so it still distinguishes
    /// the key.
    ///
    /// # Example
    ///
    /// ```
    /// use stash_core::{CacheArgs, KeyPart};
    ///
    /// let params = ["company", "year"];
    /// let by_position = CacheArgs::bind(&params, &[&"Acme"], &[]);
    /// let by_name = CacheArgs::bind(
    ///     &params,
    ///     &[],
    ///     &[("company", &"Acme" as &dyn KeyPart), ("year", &None::<u16>)],
    /// );
    ///
    /// assert_eq!(by_position, by_name);
    /// ```
    pub fn bind(
        params: &[&str],
        positional: &[&dyn KeyPart],
        named: &[(&str, &dyn KeyPart)],
    ) -> Self {
        let mut args = Self::new();
        for (index, value) in positional.iter().enumerate() {
            match params.get(index) {
                Some(name) => args.insert(*name, *value),
                None => args.insert(format!("_{}", index), *value),
            };
        }
        for (name, value) in named {
            args.insert(*name, *value);
        }
        args
    }

    /// Returns the string form recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of recorded arguments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no argument was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Renders `k1=v1&k2=v2` in name order.
impl fmt::Display for CacheArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CacheArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Builds [`CacheArgs`] from local variables or `name = value` pairs.
///
/// A bare identifier uses the variable name as the argument name.
///
/// ```
/// use stash_core::cache_args;
///
/// let company = "Acme";
/// let year: Option<u16> = None;
///
/// let args = cache_args!(company, year, form = "10-K");
/// assert_eq!(args.to_string(), "company=Acme&form=10-K");
/// ```
#[macro_export]
macro_rules! cache_args {
    () => {
        $crate::CacheArgs::new()
    };
    (@value $name:ident) => {
        $name
    };
    (@value $name:ident $value:expr) => {
        $value
    };
    ($($name:ident $(= $value:expr)?),+ $(,)?) => {{
        let mut args = $crate::CacheArgs::new();
        $(
            args.insert(stringify!($name), &$crate::cache_args!(@value $name $($value)?));
        )+
        args
    }};
}
