//! Item field helpers

use serde_json::Value;

/// Identity of an item, rendered as a string so `5` and `"5"` compare equal
pub fn item_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether `item` has identity `id`
pub fn has_id(item: &Value, id: &str) -> bool {
    item_id(item).as_deref() == Some(id)
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        // Handle array index
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_id_accepts_numbers_and_strings() {
        assert_eq!(item_id(&json!({"id": 5})).as_deref(), Some("5"));
        assert_eq!(item_id(&json!({"id": "abc"})).as_deref(), Some("abc"));
        assert_eq!(item_id(&json!({"name": "x"})), None);
        assert!(has_id(&json!({"id": 5}), "5"));
    }

    #[test]
    fn test_extract_nested_paths() {
        let item = json!({
            "name": "Colchón",
            "category": {"name": "Dormitorio"},
            "roles": [{"name": "admin"}],
            "tags": ["a", "b"],
            "deleted_at": null
        });

        assert_eq!(extract_json_value(&item, "name"), "Colchón");
        assert_eq!(extract_json_value(&item, "category.name"), "Dormitorio");
        assert_eq!(extract_json_value(&item, "roles.0.name"), "admin");
        assert_eq!(extract_json_value(&item, "tags"), "[2 items]");
        assert_eq!(extract_json_value(&item, "deleted_at"), "-");
        assert_eq!(extract_json_value(&item, "missing.path"), "-");
    }
}
