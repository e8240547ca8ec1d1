use std::collections::HashSet;

use serde_json::Value;

/// Store key and cookie-style TTL for the favorites list; the TTL is
/// refreshed on every toggle.
pub(crate) const FAVORITES_KEY: &str = "favorites";
pub(crate) const FAVORITES_TTL_DAYS: i64 = 30;

/// Parse the persisted favorites list. The value is a JSON array of ids;
/// ids that were written as numbers are stringified so membership checks
/// always compare string forms. Absent or malformed input reads as no
/// favorites, never as an error.
pub(crate) fn load(raw: Option<&str>) -> HashSet<String> {
    let Some(raw) = raw else {
        return HashSet::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return HashSet::new();
    };
    let Some(entries) = value.as_array() else {
        return HashSet::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
        .collect()
}

/// Pure toggle: returns a new set with `id` flipped. The caller owns
/// persisting the result and re-rendering whatever shows favorite state.
pub(crate) fn toggle(set: &HashSet<String>, id: &str) -> HashSet<String> {
    let mut next = set.clone();
    if !next.remove(id) {
        next.insert(id.to_string());
    }
    next
}

/// Inverse of `load`: a JSON array of id strings, sorted so the persisted
/// form is deterministic.
pub(crate) fn serialize(set: &HashSet<String>) -> String {
    let mut ids: Vec<&String> = set.iter().collect();
    ids.sort();
    Value::Array(ids.into_iter().map(|id| Value::String(id.clone())).collect()).to_string()
}
