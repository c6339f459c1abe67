//! Stable string conversion for argument values.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

/// A value that can take part in a cache key.
///
/// The returned string is what ends up in the fingerprint, so it must be
/// stable across runs and releases. `None` means "no value": the argument is
/// left out of the key entirely, which makes an unset optional argument and
/// an omitted one land on the same entry.
///
/// Two distinct values that render to the same string share a cache entry.
/// That is accepted; implement this trait with a finer rendering if a type
/// needs to tell such values apart.
///
/// # Example
///
/// ```
/// use stash_core::KeyPart;
///
/// assert_eq!(2024.key_part(), Some("2024".to_string()));
/// assert_eq!("Acme".key_part(), Some("Acme".to_string()));
/// assert_eq!(Option::<u16>::None.key_part(), None);
/// ```
pub trait KeyPart {
    /// Renders the value for the fingerprint.
    fn key_part(&self) -> Option<String>;
}

macro_rules! display_key_part {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl KeyPart for $ty {
                fn key_part(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )+
    };
}

display_key_part!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, str,
    String,
);

impl KeyPart for Cow<'_, str> {
    fn key_part(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl KeyPart for DateTime<Utc> {
    fn key_part(&self) -> Option<String> {
        Some(self.to_rfc3339())
    }
}

impl<T: KeyPart + ?Sized> KeyPart for &T {
    fn key_part(&self) -> Option<String> {
        (**self).key_part()
    }
}

impl<T: KeyPart> KeyPart for Option<T> {
    fn key_part(&self) -> Option<String> {
        self.as_ref().and_then(KeyPart::key_part)
    }
}

/// Sequences render as `[a, b, c]`; absent elements are skipped.
impl<T: KeyPart> KeyPart for [T] {
    fn key_part(&self) -> Option<String> {
        let parts: Vec<String> = self.iter().filter_map(KeyPart::key_part).collect();
        Some(format!("[{}]", parts.join(", ")))
    }
}

impl<T: KeyPart> KeyPart for Vec<T> {
    fn key_part(&self) -> Option<String> {
        self.as_slice().key_part()
    }
}
