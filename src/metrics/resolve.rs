//! Scalar resolution for ambiguously shaped readings.

use crate::telemetry::FieldValue;

/// Keys tried, in order, when a reading arrives as a mapping.
pub const VALUE_KEYS: [&str; 6] = ["val", "value", "cur", "current", "avg", "speed"];

/// Nesting depth beyond which a reading resolves to zero.
pub const MAX_RESOLVE_DEPTH: usize = 16;

/// Reduce any reading to a single float.
///
/// - numbers are returned as-is
/// - sequences resolve to their first element (empty ⇒ `0.0`)
/// - mappings resolve the first of [`VALUE_KEYS`] they contain (none ⇒ `0.0`)
/// - durations resolve to their total seconds
/// - anything else is `0.0`
///
/// This never fails.
pub fn resolve(value: &FieldValue) -> f64 {
    resolve_at(value, 0)
}

fn resolve_at(value: &FieldValue, depth: usize) -> f64 {
    if depth > MAX_RESOLVE_DEPTH {
        return 0.0;
    }
    match value {
        FieldValue::Number(n) => *n,
        FieldValue::Duration(d) => d.as_secs_f64(),
        FieldValue::Sequence(items) => items
            .first()
            .map_or(0.0, |first| resolve_at(first, depth + 1)),
        FieldValue::Mapping(map) => VALUE_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .map_or(0.0, |inner| resolve_at(inner, depth + 1)),
        FieldValue::Bool(_) | FieldValue::Text(_) | FieldValue::Null => 0.0,
    }
}

/// Resolve `key` of a mapping, treating a missing key as `0.0`.
pub fn resolve_key(value: &FieldValue, key: &str) -> f64 {
    value.get(key).map_or(0.0, resolve)
}

/// Resolve the first of `keys` present in a mapping.
pub fn resolve_first_key(value: &FieldValue, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| value.get(key))
        .map_or(0.0, resolve)
}
