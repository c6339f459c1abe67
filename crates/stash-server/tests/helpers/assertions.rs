//! Custom assertions para tests.

use serde_json::Value;

/// Verifica el body de error `{error, message}`.
pub fn assert_error_body(json: &Value, expected_error: &str) {
    let obj = json.as_object().expect("Error body should be a JSON object");

    assert_eq!(obj.len(), 2, "Unexpected error fields: {}", json);
    assert_eq!(obj["error"], expected_error);
    assert!(obj["message"].is_string(), "'message' should be a string");
}

/// Verifica la respuesta de una invalidacion.
pub fn assert_invalidated(json: &Value, expected: u64) {
    assert_eq!(
        json["invalidated"].as_u64(),
        Some(expected),
        "Unexpected invalidation response: {}",
        json
    );
    assert!(json["message"].is_string(), "'message' should be a string");
}
