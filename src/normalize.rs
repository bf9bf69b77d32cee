//! Canonicalization of heterogeneously-shaped store values.
//!
//! Some backing stores return id-list fields as either an array or an object
//! of values, depending on how the field was last written. Everything deeper
//! in the core works on one canonical shape: an ordered sequence of strings.
//! Normalization runs at both the read boundary (typed decode) and the write
//! boundary (gateway submission); no other layer branches on shape.

use serde_json::Value;

/// Canonicalize an id-list value into an ordered sequence of strings.
///
/// Arrays keep their element order; objects contribute their values in key
/// order. Scalar ids (strings, numbers, booleans) are coerced to strings;
/// null and composite elements are dropped. Any other shape yields an empty
/// list.
pub fn normalize_id_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_id).collect(),
        Value::Object(map) => map.values().filter_map(value_to_id).collect(),
        _ => Vec::new(),
    }
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Set-union an id into a list: deduplicates the existing entries (first
/// occurrence wins) and appends the id if not already present.
pub fn union_id(list: &[String], id: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(list.len() + 1);
    for entry in list {
        if !out.iter().any(|e| e == entry) {
            out.push(entry.clone());
        }
    }
    if !out.iter().any(|e| e == id) {
        out.push(id.to_string());
    }
    out
}

/// Remove every occurrence of an id from a list.
pub fn remove_id(list: &[String], id: &str) -> Vec<String> {
    list.iter().filter(|e| e.as_str() != id).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_array_shape() {
        let value = json!(["a", "b", 3]);
        assert_eq!(normalize_id_list(&value), vec!["a", "b", "3"]);
    }

    #[test]
    fn test_object_shape() {
        let value = json!({"0": "a", "1": "b"});
        assert_eq!(normalize_id_list(&value), vec!["a", "b"]);
    }

    #[test]
    fn test_scalar_and_null_yield_empty() {
        assert!(normalize_id_list(&json!("lone")).is_empty());
        assert!(normalize_id_list(&Value::Null).is_empty());
    }

    #[test]
    fn test_null_and_composite_elements_dropped() {
        let value = json!(["a", null, {"x": 1}, "b"]);
        assert_eq!(normalize_id_list(&value), vec!["a", "b"]);
    }

    #[test]
    fn test_union_is_idempotent() {
        let list = vec!["a".to_string(), "b".to_string()];
        let once = union_id(&list, "c");
        let twice = union_id(&once, "c");
        assert_eq!(once, twice);
        assert_eq!(once, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_union_dedups_existing() {
        let list = vec!["a".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(union_id(&list, "b"), vec!["a", "b"]);
    }

    #[test]
    fn test_remove() {
        let list = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(remove_id(&list, "a"), vec!["b"]);
        assert_eq!(remove_id(&list, "missing"), vec!["a", "b", "a"]);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_stable(ids in proptest::collection::vec("[a-z0-9]{1,8}", 0..8)) {
            let value = json!(ids);
            let first = normalize_id_list(&value);
            let second = normalize_id_list(&json!(first));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_union_contains_exactly_once(
            ids in proptest::collection::vec("[a-z]{1,4}", 0..8),
            id in "[a-z]{1,4}",
        ) {
            let merged = union_id(&ids, &id);
            prop_assert_eq!(merged.iter().filter(|e| **e == id).count(), 1);
        }
    }
}
