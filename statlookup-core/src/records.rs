//! Read-only views into WDS reply bodies.
//!
//! WDS answers with `[{ "status": "SUCCESS" | "FAILED", "object": {...} }, ...]`,
//! but error pages, single objects and odd shapes do turn up. Nothing here
//! assumes a shape; every accessor returns `Option` or an empty slice.

use serde_json::Value;

pub const SUCCESS: &str = "SUCCESS";

fn is_success_record(record: &Value) -> bool {
    record.get("status").and_then(Value::as_str) == Some(SUCCESS)
        && record.get("object").is_some_and(is_truthy)
}

/// First record that succeeded and carries an object payload. A bare record
/// whose `object` already holds `vectorDataPoint` counts as well.
pub fn first_success(payload: &Value) -> Option<&Value> {
    match payload {
        Value::Array(records) => records.iter().find(|r| is_success_record(r)),
        Value::Object(_) if payload.pointer("/object/vectorDataPoint").is_some_and(is_truthy) => {
            Some(payload)
        }
        _ => None,
    }
}

/// Payload objects of every `SUCCESS` record; `None` when the body is not an array.
pub fn success_objects(payload: &Value) -> Option<Vec<&Value>> {
    let records = payload.as_array()?;
    Some(
        records
            .iter()
            .filter(|r| r.get("status").and_then(Value::as_str) == Some(SUCCESS))
            .map(|r| r.get("object").unwrap_or(&Value::Null))
            .collect(),
    )
}

/// Data points of a vector payload: `vectorDataPoint`, else `vectorData`.
/// `None` when the field present is not an array.
pub fn data_points(object: &Value) -> Option<&[Value]> {
    let points = object
        .get("vectorDataPoint")
        .filter(|v| is_truthy(v))
        .or_else(|| object.get("vectorData").filter(|v| is_truthy(v)));
    match points {
        None => Some(&[]),
        Some(Value::Array(items)) => Some(items.as_slice()),
        Some(_) => None,
    }
}

/// `v<id>` when the payload carries a vector id, otherwise empty.
pub fn vector_label(object: &Value) -> String {
    match object.get("vectorId") {
        Some(id) if is_truthy(id) => format!("v{}", display_value(id)),
        _ => String::new(),
    }
}

/// Text of a field for display: strings unquoted, other values as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A string field, or empty when absent or not a string.
pub fn str_field<'a>(object: &'a Value, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or("")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_success_skips_failed_and_empty_records() {
        let payload = json!([
            {"status": "FAILED", "object": "Vector not found"},
            {"status": "SUCCESS", "object": null},
            {"status": "SUCCESS", "object": {"vectorId": 2}}
        ]);
        let found = first_success(&payload).unwrap();
        assert_eq!(found["object"]["vectorId"], 2);
    }

    #[test]
    fn test_first_success_accepts_bare_vector_record() {
        let payload = json!({"object": {"vectorId": 5, "vectorDataPoint": []}});
        assert!(first_success(&payload).is_some());

        let no_points = json!({"object": {"vectorId": 5}});
        assert!(first_success(&no_points).is_none());
        assert!(first_success(&json!("oops")).is_none());
    }

    #[test]
    fn test_success_objects_requires_array() {
        assert!(success_objects(&json!({"status": "SUCCESS"})).is_none());
        let body = json!([
            {"status": "SUCCESS", "object": {"productId": 1}},
            {"status": "FAILED"}
        ]);
        let objs = success_objects(&body).unwrap();
        assert_eq!(objs.len(), 1);
    }

    #[test]
    fn test_data_points_falls_back_to_vector_data() {
        let obj = json!({"vectorData": [{"value": 1}]});
        assert_eq!(data_points(&obj).unwrap().len(), 1);
        assert_eq!(data_points(&json!({})).unwrap().len(), 0);
        assert!(data_points(&json!({"vectorDataPoint": "nope"})).is_none());
    }

    #[test]
    fn test_vector_label() {
        assert_eq!(vector_label(&json!({"vectorId": 41690973})), "v41690973");
        assert_eq!(vector_label(&json!({"vectorId": 0})), "");
        assert_eq!(vector_label(&json!({})), "");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("2024-01")), "2024-01");
        assert_eq!(display_value(&json!(158.3)), "158.3");
        assert_eq!(display_value(&Value::Null), "null");
    }
}
