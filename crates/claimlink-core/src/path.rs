//! Tolerant dotted-path traversal over semi-structured JSON.
//!
//! The claims API returns resources where almost every intermediate object
//! may be absent. These helpers walk a dot-separated path and return `None`
//! on the first missing segment instead of panicking, so callers can pull a
//! deeply nested field in one expression:
//!
//! ```
//! use serde_json::json;
//! use claimlink_core::path::str_at;
//!
//! let claim = json!({
//!     "diagnosisCodeableConcept": { "coding": [{ "display": "Essential hypertension" }] }
//! });
//!
//! assert_eq!(
//!     str_at(&claim, "diagnosisCodeableConcept.coding.0.display"),
//!     Some("Essential hypertension")
//! );
//! assert_eq!(str_at(&claim, "diagnosisCodeableConcept.coding.3.display"), None);
//! ```
//!
//! Numeric segments index into arrays; every other segment is an object key.

use serde_json::Value;

/// Walks `path` from `root`, returning the value at the end of the path.
///
/// Returns `None` if any segment is missing, out of bounds, or applied to a
/// value that is not a container.
#[must_use]
pub fn value_at<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String at `path`, or `None`.
#[must_use]
pub fn str_at<'a>(root: &'a Value, path: &str) -> Option<&'a str> {
    value_at(root, path)?.as_str()
}

/// Owned string at `path`, or `None`.
#[must_use]
pub fn string_at(root: &Value, path: &str) -> Option<String> {
    str_at(root, path).map(str::to_owned)
}

/// Number at `path` as `f64`, or `None`.
#[must_use]
pub fn f64_at(root: &Value, path: &str) -> Option<f64> {
    value_at(root, path)?.as_f64()
}

/// Number at `path` as `u64`, or `None`.
#[must_use]
pub fn u64_at(root: &Value, path: &str) -> Option<u64> {
    value_at(root, path)?.as_u64()
}

/// Boolean at `path`, or `None`.
#[must_use]
pub fn bool_at(root: &Value, path: &str) -> Option<bool> {
    value_at(root, path)?.as_bool()
}

/// Array at `path`, or `None`.
#[must_use]
pub fn array_at<'a>(root: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
    value_at(root, path)?.as_array()
}
