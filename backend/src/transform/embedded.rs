//! Decoding of JSON blobs embedded in response rows.
//!
//! Rows carry location and launch context as raw JSON text. A malformed blob
//! never aborts a response: it is logged and the affected fields become
//! absent.

use serde_json::{json, Map, Value};

use crate::logs::log_warning;
use crate::models::{Location, LOCATION_UNAVAILABLE};

/// Flatten a raw location blob.
///
/// Returns an all-absent [`Location`] when the status is `unavailable`, when
/// there is no blob, or when the blob is not a JSON object.
pub fn flatten_location(status: &str, raw: Option<&str>) -> Location {
    if status == LOCATION_UNAVAILABLE {
        return Location::default();
    }
    let Some(raw) = raw else {
        return Location::default();
    };

    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            log_warning(format!("Location is not a JSON object: {}", raw));
            return Location::default();
        }
        Err(e) => {
            log_warning(format!("Malformed location JSON ({}): {}", e, raw));
            return Location::default();
        }
    };

    Location {
        latitude: number_field(&object, "latitude"),
        longitude: number_field(&object, "longitude"),
        accuracy: number_field(&object, "accuracy"),
        provider: string_field(&object, "provider"),
        timestamp: string_field(&object, "timestamp"),
    }
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    match object.get(key)? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Empty strings count as absent.
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JSON value for an optional float; `null` when absent.
pub fn float_value(value: Option<f64>) -> Value {
    value.map(|f| json!(f)).unwrap_or(Value::Null)
}

/// Parse a raw location blob into a JSON object, `None` when absent or bad.
pub fn location_object(raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => Some(v),
        Ok(_) | Err(_) => {
            log_warning(format!("Dropping malformed location: {}", raw));
            None
        }
    }
}

// =============================================================================
// Launch Context
// =============================================================================

/// Full launch context as JSON; `null` when absent or malformed.
pub fn launch_context_long(raw: Option<&str>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => v,
        Ok(_) | Err(_) => {
            log_warning(format!("Malformed launch context: {}", raw));
            Value::Null
        }
    }
}

/// Abbreviated launch context.
///
/// Keeps only `launch_time` and, per active trigger, `trigger_type` plus the
/// runtime description's `trigger_timestamp` and `trigger_timezone`.
pub fn launch_context_short(raw: Option<&str>) -> Value {
    let long = launch_context_long(raw);
    let Value::Object(lc) = long else {
        return Value::Null;
    };

    let mut short = Map::new();
    if let Some(Value::String(launch_time)) = lc.get("launch_time") {
        short.insert("launch_time".to_string(), json!(launch_time));
    }

    if let Some(Value::Array(triggers)) = lc.get("active_triggers") {
        let abbreviated: Vec<Value> = triggers
            .iter()
            .map(|trigger| {
                let mut entry = Map::new();
                if let Some(Value::String(t)) = trigger.get("trigger_type") {
                    entry.insert("trigger_type".to_string(), json!(t));
                }
                if let Some(Value::Object(runtime)) = trigger.get("runtime_description") {
                    for key in ["trigger_timestamp", "trigger_timezone"] {
                        if let Some(Value::String(v)) = runtime.get(key) {
                            entry.insert(key.to_string(), json!(v));
                        }
                    }
                }
                Value::Object(entry)
            })
            .collect();
        short.insert("active_triggers".to_string(), Value::Array(abbreviated));
    }

    Value::Object(short)
}

// =============================================================================
// Typed Values
// =============================================================================

/// Convert a display value to the most specific JSON type.
///
/// Integer first, then float, then a JSON array or object when the text is
/// JSON-shaped and well-formed; anything else stays a string.
pub fn typed_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return json!(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return json!(f);
        }
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v) => return v,
            Err(e) => log_warning(format!("Cannot parse JSON-shaped value ({}): {}", e, raw)),
        }
    }
    Value::String(raw.to_string())
}

/// Whether a cell value looks like a JSON array or object.
pub fn is_json_shaped(value: &str) -> bool {
    let trimmed = value.trim_start();
    trimmed.starts_with('[') || trimmed.starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_location() {
        let raw = r#"{"latitude": 34.07, "longitude": -118.44, "accuracy": 12,
                      "provider": "gps", "timestamp": "2012-01-01 00:00:01"}"#;
        let loc = flatten_location("valid", Some(raw));
        assert_eq!(loc.latitude, Some(34.07));
        assert_eq!(loc.longitude, Some(-118.44));
        assert_eq!(loc.accuracy, Some(12.0));
        assert_eq!(loc.provider.as_deref(), Some("gps"));
        assert_eq!(loc.timestamp.as_deref(), Some("2012-01-01 00:00:01"));
    }

    #[test]
    fn test_flatten_location_partial_fields() {
        let loc = flatten_location("valid", Some(r#"{"latitude": "1.5", "provider": ""}"#));
        assert_eq!(loc.latitude, Some(1.5));
        assert_eq!(loc.longitude, None);
        assert_eq!(loc.provider, None);
    }

    #[test]
    fn test_flatten_location_unavailable_ignores_blob() {
        let loc = flatten_location("unavailable", Some(r#"{"latitude": 1.0}"#));
        assert_eq!(loc, Location::default());
    }

    #[test]
    fn test_flatten_location_malformed_is_tolerated() {
        let loc = flatten_location("valid", Some("{latitude: oops"));
        assert_eq!(loc, Location::default());
    }

    #[test]
    fn test_launch_context_short() {
        let raw = r#"{
            "launch_time": "2012-01-01 00:00:00",
            "extra": "dropped",
            "active_triggers": [
                {"trigger_type": "TimeTrigger", "trigger_id": 4,
                 "runtime_description": {"trigger_timestamp": "2012-01-01 00:00:00",
                                         "trigger_timezone": "UTC", "other": 1}}
            ]
        }"#;
        let short = launch_context_short(Some(raw));
        assert_eq!(
            short,
            json!({
                "launch_time": "2012-01-01 00:00:00",
                "active_triggers": [{
                    "trigger_type": "TimeTrigger",
                    "trigger_timestamp": "2012-01-01 00:00:00",
                    "trigger_timezone": "UTC"
                }]
            })
        );
    }

    #[test]
    fn test_launch_context_malformed_or_absent() {
        assert_eq!(launch_context_long(None), Value::Null);
        assert_eq!(launch_context_long(Some("not json")), Value::Null);
        assert_eq!(launch_context_short(Some("[1,2]")), Value::Null);
    }

    #[test]
    fn test_typed_value() {
        assert_eq!(typed_value("3"), json!(3));
        assert_eq!(typed_value("2.5"), json!(2.5));
        assert_eq!(typed_value("[0,2]"), json!([0, 2]));
        assert_eq!(typed_value(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(typed_value("[broken"), json!("[broken"));
        assert_eq!(typed_value("NaN"), json!("NaN"));
        assert_eq!(typed_value("happy"), json!("happy"));
    }

    #[test]
    fn test_is_json_shaped() {
        assert!(is_json_shaped("[1,2]"));
        assert!(is_json_shaped(" {\"a\":1}"));
        assert!(!is_json_shaped("a,b"));
    }
}
