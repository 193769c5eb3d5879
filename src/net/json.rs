//! JSON extraction utilities for provider API responses.
//!
//! Provider payloads wrap everything in a `result` envelope. These helpers
//! navigate such envelopes with dot notation.
//!
//! # Examples
//!
//! ```rust
//! use goctruyen::net::json;
//! use serde_json::json;
//!
//! let data = json!({
//!     "result": {
//!         "data": ["/image/1.jpg", "/image/2.jpg"]
//!     }
//! });
//!
//! let pages: Vec<String> = json::extract_as(&data, "result.data").unwrap();
//! assert_eq!(pages.len(), 2);
//! assert!(json::extract_path(&data, "result.missing").is_none());
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extracts a value from nested JSON using dot notation.
///
/// Returns `None` if any part of the path doesn't exist.
pub fn extract_path<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;

    for key in path.split('.') {
        current = current.get(key)?;
    }

    Some(current)
}

/// Extracts and deserializes a value from a nested JSON path.
///
/// # Errors
///
/// * [`Error::Parse`](crate::Error::Parse) - If the path doesn't exist, is
///   `null`, or the value does not deserialize into `T`
pub fn extract_as<T>(json: &Value, path: &str) -> crate::Result<T>
where
    T: DeserializeOwned,
{
    let value = extract_path(json, path)
        .filter(|v| !v.is_null())
        .ok_or_else(|| crate::Error::parse(format!("Path not found: {}", path)))?;
    T::deserialize(value)
        .map_err(|e| crate::Error::parse(format!("Unexpected value at {}: {}", path, e)))
}

/// Extracts an array from a nested JSON path.
///
/// Returns an empty slice if the path doesn't exist or is not an array.
pub fn extract_array<'a>(json: &'a Value, path: &str) -> &'a [Value] {
    extract_path(json, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
