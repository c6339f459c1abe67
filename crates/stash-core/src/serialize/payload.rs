//! Tagged input values accepted by the serializer.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::error::StashError;
use crate::value::StoredValue;

/// A result value on its way into the cache.
///
/// The set of shapes is closed: every value the cache stores is one of these
/// variants, and [`serialize`](super::serialize) visits each one explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Absent value
    Null,
    /// Boolean primitive
    Bool(bool),
    /// Integer primitive
    Integer(i64),
    /// Unsigned primitive, for values that do not fit `i64`
    Unsigned(u64),
    /// Float primitive
    Float(f64),
    /// String primitive
    Text(String),
    /// Point in time, stored as an RFC 3339 string
    Timestamp(DateTime<Utc>),
    /// Ordered sequence
    Sequence(Vec<Payload>),
    /// String-keyed mapping, insertion order preserved
    Mapping(IndexMap<String, Payload>),
    /// Structured record captured through serde
    Record(Record),
    /// Anything that could only be kept as text
    Opaque(String),
}

/// The form in which a structured record was captured.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Record dumped to a JSON tree.
    Json(serde_json::Value),
    /// JSON dump failed; record converted to a plain mapping instead.
    Mapping(serde_yaml::Value),
}

impl Payload {
    /// Captures a structured record.
    ///
    /// Tries a JSON dump first. When that fails (maps keyed by sequences or
    /// records, serializers that reject JSON), falls back to a plain mapping
    /// whose keys are stringified, and as a last resort to the `Debug`
    /// representation of the value. Never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use stash_core::Payload;
    /// use serde::Serialize;
    ///
    /// #[derive(Debug, Serialize)]
    /// struct Quote { symbol: String, price: f64 }
    ///
    /// let payload = Payload::record(&Quote { symbol: "ACME".into(), price: 12.5 });
    /// assert!(matches!(payload, Payload::Record(_)));
    /// ```
    pub fn record<T>(value: &T) -> Self
    where
        T: Serialize + std::fmt::Debug + ?Sized,
    {
        let type_name = std::any::type_name::<T>();

        let json_error = match serde_json::to_value(value) {
            Ok(json) => return Payload::Record(Record::Json(json)),
            Err(e) => StashError::serialization_with_cause(type_name, "record dump failed", e),
        };
        warn!(error = %json_error, "Falling back to plain mapping");

        let mapping_error = match serde_yaml::to_value(value) {
            Ok(mapping) => return Payload::Record(Record::Mapping(mapping)),
            Err(e) => StashError::serialization_with_cause(type_name, "mapping conversion failed", e),
        };
        warn!(error = %mapping_error, "Falling back to string representation");

        Payload::Opaque(format!("{:?}", value))
    }
}

// ==========================================
// From Conversions for Ergonomics
// ==========================================

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Bool(v)
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Payload::Integer(v)
    }
}

impl From<i32> for Payload {
    fn from(v: i32) -> Self {
        Payload::Integer(v as i64)
    }
}

impl From<u32> for Payload {
    fn from(v: u32) -> Self {
        Payload::Integer(v as i64)
    }
}

impl From<u64> for Payload {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Payload::Integer(i),
            Err(_) => Payload::Unsigned(v),
        }
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Payload::Float(v)
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::Text(v)
    }
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Payload {
    fn from(v: DateTime<Utc>) -> Self {
        Payload::Timestamp(v)
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Payload::Null)
    }
}

impl<T: Into<Payload>> From<Vec<T>> for Payload {
    fn from(v: Vec<T>) -> Self {
        Payload::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Payload>> From<IndexMap<String, T>> for Payload {
    fn from(v: IndexMap<String, T>) -> Self {
        Payload::Mapping(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Record(Record::Json(v))
    }
}

impl From<StoredValue> for Payload {
    fn from(v: StoredValue) -> Self {
        match v {
            StoredValue::Null => Payload::Null,
            StoredValue::Bool(b) => Payload::Bool(b),
            StoredValue::Integer(i) => Payload::Integer(i),
            StoredValue::Unsigned(u) => Payload::Unsigned(u),
            StoredValue::Float(f) => Payload::Float(f.into_inner()),
            StoredValue::String(s) => Payload::Text(s),
            StoredValue::Array(arr) => Payload::Sequence(arr.into_iter().map(Into::into).collect()),
            StoredValue::Object(obj) => {
                Payload::Mapping(obj.into_iter().map(|(k, v)| (k, v.into())).collect())
            },
        }
    }
}
