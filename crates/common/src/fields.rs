//! Helpers for the configured required-fields list and for reading field
//! values out of canonical request content.

use serde_json::Value;

/// Split a comma-separated configuration string into an ordered field list.
///
/// Entries are trimmed, blanks are dropped, and duplicates collapse to
/// their first occurrence.
#[must_use]
pub fn split_fields(separated: &str) -> Vec<String> {
    let mut fields = Vec::new();
    for entry in separated.split(',') {
        let trimmed = entry.trim();
        if !trimmed.is_empty() && !fields.iter().any(|existing| existing == trimmed) {
            fields.push(trimmed.to_string());
        }
    }
    fields
}

/// Length of a canonical-content value.
///
/// Strings count characters, arrays and objects count entries, `null` is
/// empty, numbers and booleans are never empty.
#[must_use]
pub fn value_len(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::Bool(_) | Value::Number(_) => 1,
    }
}

/// Render a field value for template substitution.
///
/// Strings pass through unquoted. A one-element array renders as its
/// single element, which keeps scalar-assuming templates working against
/// form-decoded content. Everything else renders as compact JSON.
#[must_use]
pub fn field_as_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) if items.len() == 1 => field_as_string(&items[0]),
        other => other.to_string(),
    }
}
