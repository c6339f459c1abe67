use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A document-store compatible value: the persisted form of a cached result.
///
/// This enum is the output of the serializer and the `data` field of every
/// cache entry. It is recursive (Arrays inside Objects, etc.) and uses
/// `IndexMap` to preserve key order, so a cached mapping reads back in the
/// order it was written.
///
/// # Example
///
/// ```
/// use stash_core::StoredValue;
///
/// let val: StoredValue = "hello".into();
/// assert_eq!(val.as_str(), Some("hello"));
///
/// let arr: StoredValue = vec![1, 2, 3].into();
/// assert_eq!(arr.as_array().map(|a| a.len()), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (signed 64-bit)
    Integer(i64),
    /// Unsigned integer above `i64::MAX`
    Unsigned(u64),
    /// Floating point value (wrapped in OrderedFloat for Eq support)
    Float(OrderedFloat<f64>),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<StoredValue>),
    /// Object (Map) of values
    Object(IndexMap<String, StoredValue>),
}

impl StoredValue {
    /// Converts a JSON number without losing integer precision.
    pub(crate) fn from_number(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            StoredValue::Integer(i)
        } else if let Some(u) = n.as_u64() {
            StoredValue::Unsigned(u)
        } else {
            n.as_f64()
                .map(|f| StoredValue::Float(OrderedFloat(f)))
                .unwrap_or(StoredValue::Null)
        }
    }

    /// Returns true if the value is Null.
    pub fn is_null(&self) -> bool {
        matches!(self, StoredValue::Null)
    }

    /// Returns the value as a bool if it matches.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it matches.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StoredValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a u64 if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            StoredValue::Integer(i) => u64::try_from(*i).ok(),
            StoredValue::Unsigned(u) => Some(*u),
            _ => None,
        }
    }

    /// Returns the value as an f64 if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StoredValue::Float(f) => Some(f.into_inner()),
            StoredValue::Integer(i) => Some(*i as f64),
            StoredValue::Unsigned(u) => Some(*u as f64),
            _ => None,
        }
    }

    /// Returns the value as a str if it matches.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an array slice if it matches.
    pub fn as_array(&self) -> Option<&[StoredValue]> {
        match self {
            StoredValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns the value as an object (IndexMap) if it matches.
    pub fn as_object(&self) -> Option<&IndexMap<String, StoredValue>> {
        match self {
            StoredValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when the value is an object.
    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Converts into a `serde_json::Value`.
    ///
    /// Floats that JSON cannot represent (NaN, infinities) become `null`.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            StoredValue::Null => serde_json::Value::Null,
            StoredValue::Bool(b) => serde_json::Value::Bool(b),
            StoredValue::Integer(i) => serde_json::Value::Number(i.into()),
            StoredValue::Unsigned(u) => serde_json::Value::Number(u.into()),
            StoredValue::Float(f) => serde_json::Number::from_f64(f.into_inner())
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            StoredValue::String(s) => serde_json::Value::String(s),
            StoredValue::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(StoredValue::into_json).collect())
            },
            StoredValue::Object(obj) => serde_json::Value::Object(
                obj.into_iter().map(|(k, v)| (k, v.into_json())).collect(),
            ),
        }
    }
}

// ==========================================
// From Conversions for Ergonomics
// ==========================================

impl From<bool> for StoredValue {
    fn from(v: bool) -> Self {
        StoredValue::Bool(v)
    }
}

impl From<i64> for StoredValue {
    fn from(v: i64) -> Self {
        StoredValue::Integer(v)
    }
}

impl From<i32> for StoredValue {
    fn from(v: i32) -> Self {
        StoredValue::Integer(v as i64)
    }
}

/// Values up to `i64::MAX` are stored as `Integer`.
impl From<u64> for StoredValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => StoredValue::Integer(i),
            Err(_) => StoredValue::Unsigned(v),
        }
    }
}

impl From<f64> for StoredValue {
    fn from(v: f64) -> Self {
        StoredValue::Float(OrderedFloat(v))
    }
}

impl From<String> for StoredValue {
    fn from(v: String) -> Self {
        StoredValue::String(v)
    }
}

impl From<&str> for StoredValue {
    fn from(v: &str) -> Self {
        StoredValue::String(v.to_string())
    }
}

impl<T: Into<StoredValue>> From<Vec<T>> for StoredValue {
    fn from(v: Vec<T>) -> Self {
        StoredValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for StoredValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => StoredValue::Null,
            serde_json::Value::Bool(b) => StoredValue::Bool(b),
            serde_json::Value::Number(n) => StoredValue::from_number(&n),
            serde_json::Value::String(s) => StoredValue::String(s),
            serde_json::Value::Array(arr) => {
                StoredValue::Array(arr.into_iter().map(StoredValue::from).collect())
            },
            serde_json::Value::Object(obj) => StoredValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, StoredValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<StoredValue> for serde_json::Value {
    fn from(value: StoredValue) -> Self {
        value.into_json()
    }
}
