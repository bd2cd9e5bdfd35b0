//! Total lookups into schema-less JSON.
//!
//! Every hop returns `None` when the key is missing, the value is JSON null,
//! or the parent has the wrong shape.

use serde_json::Value;

/// One step of a JSON path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop<'a> {
    Key(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for Hop<'a> {
    fn from(key: &'a str) -> Self {
        Hop::Key(key)
    }
}

impl From<usize> for Hop<'_> {
    fn from(index: usize) -> Self {
        Hop::Index(index)
    }
}

pub fn hop<'v>(value: &'v Value, step: Hop<'_>) -> Option<&'v Value> {
    let next = match step {
        Hop::Key(key) => value.as_object()?.get(key)?,
        Hop::Index(index) => value.as_array()?.get(index)?,
    };
    if next.is_null() {
        None
    } else {
        Some(next)
    }
}

/// Follow a path of object keys
pub fn get<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| hop(current, Hop::Key(*key)))
}

/// Follow a path mixing keys and array indices
pub fn get_path<'v>(value: &'v Value, path: &[Hop<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, step| hop(current, *step))
}

/// Scalar rendered as text: strings verbatim, numbers and booleans in JSON notation.
/// Objects and arrays are rendered as compact JSON.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `text` of the value at `path`
pub fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    get(value, path).and_then(text)
}

/// Placeholder form used inside composite strings, `None` for absent parts
pub fn display_or_none(value: Option<&Value>) -> String {
    value.and_then(text).unwrap_or_else(|| "None".to_string())
}

/// Whether a value counts as present for optional composites
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
