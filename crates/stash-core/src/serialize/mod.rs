//! Conversion of result values into storable documents.
//!
//! Every value that enters the cache is first described as a [`Payload`]
//! and then visited by [`serialize`], which produces the [`StoredValue`]
//! tree persisted in the document store.

mod payload;

pub use payload::{Payload, Record};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::value::StoredValue;

/// Converts a payload into a document-store compatible tree.
///
/// - `Null` -> `Null`
/// - primitives -> themselves (non-finite floats become `Null`)
/// - timestamps -> RFC 3339 strings
/// - sequences and mappings -> visited recursively, order preserved
/// - records -> their captured mapping, visited recursively
/// - opaque values -> their string form
///
/// # Example
///
/// ```
/// use stash_core::{serialize, Payload, StoredValue};
///
/// let stored = serialize(Payload::from(vec![1i64, 2, 3]));
/// assert_eq!(stored, StoredValue::from(vec![1, 2, 3]));
/// ```
pub fn serialize(payload: Payload) -> StoredValue {
    match payload {
        Payload::Null => StoredValue::Null,
        Payload::Bool(b) => StoredValue::Bool(b),
        Payload::Integer(i) => StoredValue::Integer(i),
        Payload::Unsigned(u) => StoredValue::from(u),
        Payload::Float(f) => float(f),
        Payload::Text(s) => StoredValue::String(s),
        Payload::Timestamp(ts) => StoredValue::String(ts.to_rfc3339()),
        Payload::Sequence(items) => StoredValue::Array(items.into_iter().map(serialize).collect()),
        Payload::Mapping(map) => StoredValue::Object(
            map.into_iter()
                .map(|(k, v)| (k, serialize(v)))
                .collect(),
        ),
        Payload::Record(Record::Json(json)) => from_json(json),
        Payload::Record(Record::Mapping(yaml)) => from_yaml(yaml),
        Payload::Opaque(repr) => {
            debug!("Storing opaque value as its string form");
            StoredValue::String(repr)
        },
    }
}

fn float(f: f64) -> StoredValue {
    if f.is_finite() {
        StoredValue::Float(OrderedFloat(f))
    } else {
        StoredValue::Null
    }
}

fn from_json(json: serde_json::Value) -> StoredValue {
    StoredValue::from(json)
}

fn from_yaml(yaml: serde_yaml::Value) -> StoredValue {
    use serde_yaml::Value;

    match yaml {
        Value::Null => StoredValue::Null,
        Value::Bool(b) => StoredValue::Bool(b),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => StoredValue::Integer(i),
            (None, Some(u)) => StoredValue::Unsigned(u),
            (None, None) => n.as_f64().map(float).unwrap_or(StoredValue::Null),
        },
        Value::String(s) => StoredValue::String(s),
        Value::Sequence(items) => StoredValue::Array(items.into_iter().map(from_yaml).collect()),
        Value::Mapping(map) => {
            let mut object = IndexMap::with_capacity(map.len());
            for (k, v) in map {
                object.insert(mapping_key(k), from_yaml(v));
            }
            StoredValue::Object(object)
        },
        // Enum tags carry no meaning once stored
        Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

/// Stringifies a mapping key. Plain scalars keep their natural text,
/// composite keys are rendered as compact JSON.
fn mapping_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value;

    match key {
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        composite => {
            let json = from_yaml(composite).into_json();
            serde_json::to_string(&json).unwrap_or_else(|_| json.to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde::{Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize)]
    struct Filing {
        company: String,
        year: u16,
        tags: Vec<String>,
    }

    #[derive(Debug)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refuses to serialize"))
        }
    }

    #[test]
    fn test_null_stays_null() {
        assert_eq!(serialize(Payload::Null), StoredValue::Null);
    }

    #[test]
    fn test_timestamp_is_iso_string() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let stored = serialize(Payload::Timestamp(ts));

        assert_eq!(stored.as_str(), Some("2024-03-01T12:30:00+00:00"));
    }

    #[test]
    fn test_sequence_preserves_order() {
        let payload = Payload::Sequence(vec!["b".into(), "a".into(), Payload::Integer(3)]);
        let stored = serialize(payload);

        let items = stored.as_array().unwrap();
        assert_eq!(items[0].as_str(), Some("b"));
        assert_eq!(items[1].as_str(), Some("a"));
        assert_eq!(items[2].as_i64(), Some(3));
    }

    #[test]
    fn test_nested_mapping_with_timestamps() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        let mut inner = IndexMap::new();
        inner.insert("published".to_string(), Payload::Timestamp(ts));
        let mut outer = IndexMap::new();
        outer.insert("article".to_string(), Payload::Mapping(inner));

        let stored = serialize(Payload::Mapping(outer));

        assert_eq!(
            stored.get("article").and_then(|a| a.get("published")).and_then(|p| p.as_str()),
            Some("2023-12-31T00:00:00+00:00")
        );
    }

    #[test]
    fn test_record_is_dumped_to_mapping() {
        let filing = Filing {
            company: "Acme".into(),
            year: 2024,
            tags: vec!["10-K".into()],
        };
        let stored = serialize(Payload::record(&filing));

        assert_eq!(stored.get("company").unwrap().as_str(), Some("Acme"));
        assert_eq!(stored.get("year").unwrap().as_i64(), Some(2024));
        assert_eq!(stored.get("tags").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_record_mapping_fallback_stringifies_keys() {
        let mut map = BTreeMap::new();
        map.insert(vec![1, 2], "pair");

        let stored = serialize(Payload::record(&map));

        assert_eq!(stored.get("[1,2]").unwrap().as_str(), Some("pair"));
    }

    #[test]
    fn test_unserializable_record_falls_back_to_string() {
        let stored = serialize(Payload::record(&Unserializable));

        assert_eq!(stored.as_str(), Some("Unserializable"));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(serialize(Payload::Float(f64::INFINITY)), StoredValue::Null);
        assert_eq!(serialize(Payload::Float(1.5)).as_f64(), Some(1.5));
    }

    #[test]
    fn test_unsigned_above_i64_is_not_a_float() {
        let stored = serialize(Payload::from(u64::MAX));
        assert_eq!(stored, StoredValue::Unsigned(u64::MAX));

        let record = serialize(Payload::record(&serde_json::json!({"id": u64::MAX})));
        assert_eq!(record.get("id").and_then(StoredValue::as_u64), Some(u64::MAX));
    }
}
