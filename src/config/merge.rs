//! Deep merge of configuration tiers.
//!
//! Higher tier values override lower tier values field by field. Arrays are
//! replaced entirely, not concatenated.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - A null overlay keeps the base value (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use taskdeck::config::deep_merge;
///
/// let base = json!({ "server": { "port": 5000, "host": "127.0.0.1" } });
/// let overlay = json!({ "server": { "port": 8080 } });
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged, json!({ "server": { "port": 8080, "host": "127.0.0.1" } }));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in order, later values taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_override_keeps_siblings() {
        let base = json!({
            "server": { "host": "127.0.0.1", "port": 5000 },
            "projects": { "delete_policy": "keep" }
        });
        let overlay = json!({ "server": { "port": 9000 } });
        assert_eq!(
            deep_merge(base, overlay),
            json!({
                "server": { "host": "127.0.0.1", "port": 9000 },
                "projects": { "delete_policy": "keep" }
            })
        );
    }

    #[test]
    fn test_null_means_unspecified() {
        let base = json!({ "ai": { "model": "m1", "api_key": "k" } });
        let overlay = json!({ "ai": { "api_key": null } });
        assert_eq!(deep_merge(base.clone(), overlay), base);
    }

    #[test]
    fn test_arrays_are_replaced() {
        let merged = deep_merge(json!({ "items": [1, 2, 3] }), json!({ "items": [4] }));
        assert_eq!(merged, json!({ "items": [4] }));
    }

    #[test]
    fn test_merge_all_later_wins() {
        let merged = deep_merge_all(vec![
            json!({ "a": 1 }),
            json!({ "b": 2 }),
            json!({ "a": 3 }),
        ]);
        assert_eq!(merged, json!({ "a": 3, "b": 2 }));
    }
}
