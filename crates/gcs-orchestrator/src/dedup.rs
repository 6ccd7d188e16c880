//! Duplicate tool-call detection: two calls are the same if their name and
//! parameters match, independent of the LLM's JSON key ordering.

use serde_json::Value;
use std::collections::BTreeMap;

/// A canonical `(name, parameters)` key, stable across key-order
/// differences in `parameters`.
pub fn call_key(name: &str, parameters: &Value) -> (String, String) {
    (name.to_string(), canonicalize(parameters))
}

fn canonicalize(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, String> = map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            let entries: Vec<String> = sorted.into_iter().map(|(k, v)| format!("{k:?}:{v}")).collect();
            format!("{{{}}}", entries.join(","))
        },
        Value::Array(items) => {
            let entries: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", entries.join(","))
        },
        other => other.to_string(),
    }
}
