//! API error taxonomy
//!
//! Every failure the API client can produce is normalized into [`ApiError`]
//! before it reaches a state container. Raw transport errors never escape.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> validation messages, as returned by 422 responses
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

/// Errors produced by the generic API client.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, reset, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response, or a 2xx response whose body could not be decoded.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Value,
    },

    /// 422-style validation failure, or a local required-field check.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        status: Option<u16>,
        errors: ValidationErrors,
    },

    /// 404 from the backend.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation forbidden by the model configuration. Raised before any
    /// network call is attempted.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build the error for a non-success HTTP response.
    ///
    /// 404 becomes [`ApiError::NotFound`]; 422 becomes
    /// [`ApiError::Validation`] when the body carries a field map.
    pub fn from_response(status: u16, body: Value, url: &str) -> Self {
        let message = body_message(&body).unwrap_or_else(|| default_status_message(status));

        match status {
            404 => Self::NotFound(format!("{} ({})", message, url)),
            422 => match parse_validation_errors(&body) {
                Some(errors) => Self::Validation {
                    message,
                    status: Some(status),
                    errors,
                },
                None => Self::Http {
                    status,
                    message,
                    body,
                },
            },
            _ => Self::Http {
                status,
                message,
                body,
            },
        }
    }

    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Validation { status, .. } => *status,
            Self::NotFound(_) => Some(404),
            Self::Network(_) | Self::Configuration(_) => None,
        }
    }

    /// Field-level validation messages, if any
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Whether a read operation may be retried after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Self::Network(msg) | Self::NotFound(msg) | Self::Configuration(msg) => msg.clone(),
            Self::Http { message, .. } | Self::Validation { message, .. } => message.clone(),
        }
    }
}

/// Extract `message` (or `error` / `error.message`) from an error body
fn body_message(body: &Value) -> Option<String> {
    if let Some(msg) = body.get("message").and_then(|v| v.as_str()) {
        return Some(msg.to_string());
    }
    match body.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(obj) => obj
            .get("message")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        None => None,
    }
}

fn default_status_message(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Request failed")
        .to_string()
}

/// Parse `{errors: {field: [msg, ...] | msg}}` into a field map
pub fn parse_validation_errors(body: &Value) -> Option<ValidationErrors> {
    let errors = body.get("errors")?.as_object()?;

    let map: ValidationErrors = errors
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(arr) => arr
                    .iter()
                    .map(|m| m.as_str().map(String::from).unwrap_or_else(|| m.to_string()))
                    .collect(),
                Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect();

    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_404_maps_to_not_found() {
        let err = ApiError::from_response(404, json!({"message": "No query results"}), "/categories/9");
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_422_parses_field_messages() {
        let body = json!({
            "message": "The given data was invalid.",
            "errors": {
                "name": ["The name field is required."],
                "slug": "The slug has already been taken."
            }
        });

        let err = ApiError::from_response(422, body, "/categories");
        let errors = err.validation_errors().expect("validation errors");
        assert_eq!(errors["name"], vec!["The name field is required."]);
        assert_eq!(errors["slug"], vec!["The slug has already been taken."]);
        assert_eq!(err.message(), "The given data was invalid.");
    }

    #[test]
    fn test_422_without_field_map_stays_http() {
        let err = ApiError::from_response(422, json!({"message": "nope"}), "/x");
        assert!(matches!(err, ApiError::Http { status: 422, .. }));
    }

    #[test]
    fn test_nested_error_message() {
        let err = ApiError::from_response(500, json!({"error": {"message": "boom"}}), "/x");
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("reset".into()).is_retryable());
        assert!(ApiError::from_response(503, Value::Null, "/x").is_retryable());
        assert!(ApiError::from_response(429, Value::Null, "/x").is_retryable());
        assert!(!ApiError::from_response(400, Value::Null, "/x").is_retryable());
        assert!(!ApiError::from_response(404, Value::Null, "/x").is_retryable());
        assert!(!ApiError::configuration("no create").is_retryable());
    }

    #[test]
    fn test_default_message_uses_status_reason() {
        let err = ApiError::from_response(503, Value::Null, "/x");
        assert_eq!(err.message(), "Service Unavailable");
    }
}
