//! Wire-shape probing helpers.
//!
//! The API is not uniform: success payloads appear under `data`, `result`,
//! or at the top level depending on the endpoint, numbers arrive as numbers
//! or numeric strings, and list-ish fields arrive as a bare string or an
//! array. Normalization happens here, once, instead of at every call site.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

/// Unwrap the success envelope: `data`, then `result`, then the body itself.
pub fn envelope(body: &Value) -> &Value {
    for key in ["data", "result"] {
        if let Some(inner) = body.get(key) {
            if !inner.is_null() {
                return inner;
            }
        }
    }
    body
}

/// The envelope as a list, defaulting to empty for anything non-array.
pub fn list(body: &Value) -> Vec<Value> {
    envelope(body).as_array().cloned().unwrap_or_default()
}

/// A field that is sometimes a bare string, sometimes an array of strings.
/// Blank entries are dropped; absent/null normalizes to an empty list.
pub fn string_or_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// First non-empty string under any of the candidate keys.
pub fn string_field(obj: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Integer under any of the candidate keys; accepts numbers and
/// numeric strings.
pub fn i64_field(obj: &Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        match obj.get(key) {
            Some(Value::Number(n)) => return n.as_i64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.trim().parse::<i64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

/// Boolean under any of the candidate keys; accepts `true`, `"true"`, `1`.
pub fn bool_field(obj: &Value, keys: &[&str]) -> bool {
    for key in keys {
        match obj.get(key) {
            Some(Value::Bool(b)) => return *b,
            Some(Value::Number(n)) => return n.as_i64() == Some(1),
            Some(Value::String(s)) => {
                return matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
            }
            _ => {}
        }
    }
    false
}

/// ISO date (`YYYY-MM-DD`) under any of the candidate keys.
pub fn date_field(obj: &Value, keys: &[&str]) -> Option<NaiveDate> {
    string_field(obj, keys).and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

/// Clock time under any of the candidate keys; `HH:MM` or `HH:MM:SS`.
pub fn time_field(obj: &Value, keys: &[&str]) -> Option<NaiveTime> {
    let raw = string_field(obj, keys)?;
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
        .ok()
}
