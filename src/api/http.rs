//! HTTP utilities for backend REST calls

use super::auth::{Credentials, API_KEY_HEADER};
use super::error::ApiError;
use reqwest::{Client, Method};
use serde_json::Value;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for backend API calls
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("catadmin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Send one request and decode the JSON response.
    ///
    /// Empty success bodies decode to `Value::Null`. Every failure is mapped
    /// into the [`ApiError`] taxonomy.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, "{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(key) = credentials.api_key() {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(token) = credentials.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(%request_id, "API error: {} - {}", status, sanitize_for_log(&text));
            let body = serde_json::from_str(&text)
                .unwrap_or_else(|_| Value::String(sanitize_for_log(&text)));
            return Err(ApiError::from_response(status.as_u16(), body, url));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(%request_id, "Malformed response body from {}: {}", url, e);
            ApiError::Http {
                status: status.as_u16(),
                message: format!("Malformed response body: {}", e),
                body: Value::String(sanitize_for_log(&text)),
            }
        })
    }
}
