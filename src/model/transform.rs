//! Field transforms
//!
//! Named, pure coercions applied to outgoing payloads. Models reference
//! them by name in their JSON definition (`"position": "number"`).

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// A named per-field coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Number,
    Integer,
    Boolean,
    String,
    Trim,
    Lowercase,
    Uppercase,
    NullIfEmpty,
}

/// A transform could not coerce its input
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot apply {transform:?} to {value}")]
pub struct TransformError {
    pub transform: Transform,
    pub value: Value,
}

impl Transform {
    /// Apply this transform to a single value
    pub fn apply(self, value: &Value) -> Result<Value, TransformError> {
        let fail = || TransformError {
            transform: self,
            value: value.clone(),
        };

        match self {
            Transform::Number => to_number(value).ok_or_else(fail),
            Transform::Integer => to_number(value)
                .and_then(|n| n.as_f64())
                .map(|f| Value::from(f.trunc() as i64))
                .ok_or_else(fail),
            Transform::Boolean => to_boolean(value).map(Value::Bool).ok_or_else(fail),
            Transform::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                Value::Null => Ok(Value::String(String::new())),
                _ => Err(fail()),
            },
            Transform::Trim => map_str(value, |s| s.trim().to_string()).ok_or_else(fail),
            Transform::Lowercase => map_str(value, str::to_lowercase).ok_or_else(fail),
            Transform::Uppercase => map_str(value, str::to_uppercase).ok_or_else(fail),
            Transform::NullIfEmpty => match value {
                Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
                other => Ok(other.clone()),
            },
        }
    }
}

fn map_str(value: &Value, f: impl Fn(&str) -> String) -> Option<Value> {
    value.as_str().map(|s| Value::String(f(s)))
}

/// Numeric coercion; integral values stay integers so `"1"` becomes `1`
fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::Bool(b) => Some(Value::from(u8::from(*b))),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(i) = s.parse::<i64>() {
                return Some(Value::from(i));
            }
            let f = s.parse::<f64>().ok()?;
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                return Some(Value::from(f as i64));
            }
            Number::from_f64(f).map(Value::Number)
        }
        _ => None,
    }
}

fn to_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_names_transform_and_value() {
        let err = Transform::Boolean.apply(&json!("maybe")).unwrap_err();
        assert_eq!(err.to_string(), "cannot apply Boolean to \"maybe\"");
        assert_eq!(err.value, json!("maybe"));
    }

    #[test]
    fn test_number_keeps_integers_integral() {
        assert_eq!(Transform::Number.apply(&json!("1")).unwrap(), json!(1));
        assert_eq!(Transform::Number.apply(&json!("2.5")).unwrap(), json!(2.5));
        assert_eq!(Transform::Number.apply(&json!("3.0")).unwrap(), json!(3));
        assert_eq!(Transform::Number.apply(&json!(true)).unwrap(), json!(1));
    }

    #[test]
    fn test_number_rejects_garbage() {
        assert!(Transform::Number.apply(&json!("abc")).is_err());
        assert!(Transform::Number.apply(&json!("")).is_err());
        assert!(Transform::Number.apply(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_integer_truncates() {
        assert_eq!(Transform::Integer.apply(&json!("7.9")).unwrap(), json!(7));
        assert_eq!(Transform::Integer.apply(&json!(-2.5)).unwrap(), json!(-2));
    }

    #[test]
    fn test_boolean_accepts_form_values() {
        assert_eq!(Transform::Boolean.apply(&json!("on")).unwrap(), json!(true));
        assert_eq!(Transform::Boolean.apply(&json!("0")).unwrap(), json!(false));
        assert_eq!(Transform::Boolean.apply(&json!(2)).unwrap(), json!(true));
        assert_eq!(Transform::Boolean.apply(&Value::Null).unwrap(), json!(false));
        assert!(Transform::Boolean.apply(&json!("maybe")).is_err());
    }

    #[test]
    fn test_string_transforms() {
        assert_eq!(Transform::String.apply(&json!(12)).unwrap(), json!("12"));
        assert_eq!(Transform::Trim.apply(&json!("  a ")).unwrap(), json!("a"));
        assert_eq!(Transform::Lowercase.apply(&json!("AbC")).unwrap(), json!("abc"));
        assert_eq!(Transform::Uppercase.apply(&json!("sku-1")).unwrap(), json!("SKU-1"));
        assert!(Transform::Trim.apply(&json!(5)).is_err());
    }

    #[test]
    fn test_null_if_empty() {
        assert_eq!(Transform::NullIfEmpty.apply(&json!("  ")).unwrap(), Value::Null);
        assert_eq!(Transform::NullIfEmpty.apply(&json!("x")).unwrap(), json!("x"));
    }

    #[test]
    fn test_transform_names_deserialize() {
        let t: Transform = serde_json::from_str("\"null_if_empty\"").unwrap();
        assert_eq!(t, Transform::NullIfEmpty);
    }
}
