//! Generic API Client
//!
//! One client serves every resource: endpoints, transforms and required
//! fields come from the [`ModelConfig`] passed to each call. Read operations
//! (`list`, `get`) retry transient failures with exponential backoff; writes
//! never retry.

use super::auth::Credentials;
use super::error::{ApiError, ValidationErrors};
use super::http::HttpClient;
use crate::model::{
    normalize_item, normalize_list, payload_query, HttpMethod, ListParams, ListResult, ModelConfig,
};
use backon::{ExponentialBuilder, Retryable};
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Bounded retry settings for read operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_times: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_times: 3,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_times: 0,
            ..Self::default()
        }
    }
}

/// Main backend client
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    credentials: Credentials,
    base_url: Url,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a new client rooted at `base_url` (e.g. `https://shop.example/api`)
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::configuration(format!("Invalid base URL {}: {}", base_url, e)))?;

        Ok(Self {
            http: HttpClient::new()?,
            credentials,
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Fetch one page of `config`'s collection
    pub async fn list(&self, config: &ModelConfig, params: &ListParams) -> Result<ListResult, ApiError> {
        let endpoint = require(config.endpoints.list.as_deref(), config, "list")?;
        let url = self.url(endpoint);
        let query = params.to_query(config);

        let raw = self.read(&url, &query).await?;
        let result = normalize_list(&raw, params.page_request(config));

        tracing::debug!(
            "{}: listed {} of {} (page {}/{})",
            config.name,
            result.items.len(),
            result.total,
            result.page,
            result.total_pages
        );
        Ok(result)
    }

    /// Fetch one item by id
    pub async fn get(&self, config: &ModelConfig, id: &str) -> Result<Value, ApiError> {
        let endpoint = require(config.endpoints.get.as_deref(), config, "get")?;
        let url = self.url(&fill_id(endpoint, id));
        let raw = self.read(&url, &[]).await?;
        Ok(normalize_item(raw))
    }

    /// Validate, transform and create an item
    pub async fn create(&self, config: &ModelConfig, payload: &Value) -> Result<Value, ApiError> {
        let endpoint = require(config.endpoints.create.as_deref(), config, "create")?;

        let validation = config.validate_required(payload);
        if !validation.is_valid {
            let errors: ValidationErrors = validation
                .missing_fields
                .iter()
                .map(|field| (field.clone(), vec![format!("The {} field is required.", field)]))
                .collect();
            return Err(ApiError::Validation {
                message: validation.message.unwrap_or_default(),
                status: None,
                errors,
            });
        }

        let body = config.apply_transforms(payload);
        tracing::info!("{}: create", config.name);
        let raw = self.write(Method::POST, &self.url(endpoint), Some(&body)).await?;
        Ok(normalize_item(raw))
    }

    /// Transform and send a (possibly partial) update
    pub async fn update(&self, config: &ModelConfig, id: &str, payload: &Value) -> Result<Value, ApiError> {
        let endpoint = require(config.endpoints.update.as_deref(), config, "update")?;
        let body = config.apply_transforms(payload);

        tracing::info!("{}: update {}", config.name, id);
        let raw = self
            .write(Method::PUT, &self.url(&fill_id(endpoint, id)), Some(&body))
            .await?;
        Ok(normalize_item(raw))
    }

    /// Delete an item. Returns the server echo, or `{id, deleted: true}`
    /// when the server sends no object back.
    pub async fn remove(&self, config: &ModelConfig, id: &str) -> Result<Value, ApiError> {
        let endpoint = require(config.endpoints.delete.as_deref(), config, "delete")?;

        tracing::info!("{}: delete {}", config.name, id);
        let raw = self
            .write(Method::DELETE, &self.url(&fill_id(endpoint, id)), None)
            .await?;

        match normalize_item(raw) {
            obj @ Value::Object(_) => Ok(obj),
            _ => Ok(json!({"id": id, "deleted": true})),
        }
    }

    /// Invoke a resource-specific action at `{path}/{action}[/{id}]`.
    /// `method` overrides the method declared for the action.
    pub async fn custom_action(
        &self,
        config: &ModelConfig,
        action: &str,
        id: Option<&str>,
        payload: Option<&Value>,
        method: Option<HttpMethod>,
    ) -> Result<Value, ApiError> {
        let Some(def) = config.custom_action(action) else {
            return Err(ApiError::configuration(format!(
                "{} does not support action '{}'",
                config.name, action
            )));
        };
        if def.requires_id && id.is_none() {
            return Err(ApiError::configuration(format!(
                "{} action '{}' requires an id",
                config.name, action
            )));
        }

        let mut path = format!("{}/{}", config.path.trim_end_matches('/'), action);
        if let Some(id) = id {
            path.push('/');
            path.push_str(&urlencoding::encode(id));
        }

        let method: Method = method.unwrap_or(def.method).into();
        tracing::info!("{}: action {} {:?}", config.name, action, id);

        // One attempt for every verb; GET sends the payload as query pairs
        let url = self.url(&path);
        if method == Method::GET {
            let query = payload.map(payload_query).unwrap_or_default();
            return self
                .http
                .send(method, &url, &query, None, &self.credentials)
                .await;
        }
        self.write(method, &url, payload).await
    }

    // =========================================================================
    // Transport helpers
    // =========================================================================

    /// Absolute URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET with bounded backoff on transient failures
    async fn read(&self, url: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry.min_delay)
            .with_max_delay(self.retry.max_delay)
            .with_max_times(self.retry.max_times);

        (|| async {
            self.http
                .send(Method::GET, url, query, None, &self.credentials)
                .await
        })
        .retry(backoff)
        .when(ApiError::is_retryable)
        .notify(|err: &ApiError, delay: Duration| {
            tracing::warn!("Retrying GET {} in {:?}: {}", url, delay, err);
        })
        .await
    }

    /// Single-shot write; never retried
    async fn write(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.http.send(method, url, &[], body, &self.credentials).await
    }
}

/// Resolve an endpoint or fail before any network call
fn require<'a>(endpoint: Option<&'a str>, config: &ModelConfig, op: &str) -> Result<&'a str, ApiError> {
    endpoint.ok_or_else(|| {
        ApiError::configuration(format!("{} does not support {}", config.name, op))
    })
}

/// Substitute the percent-encoded id into an endpoint template
fn fill_id(template: &str, id: &str) -> String {
    let encoded = urlencoding::encode(id);
    if template.contains("{id}") {
        template.replace("{id}", &encoded)
    } else {
        format!("{}/{}", template.trim_end_matches('/'), encoded)
    }
}

/// Format an API error for display
/// Security: Maps statuses to generic messages to avoid leaking backend details
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(_) => {
            "Could not reach the backend. Check your network connection and base URL.".to_string()
        }
        ApiError::Configuration(msg) => msg.clone(),
        ApiError::NotFound(_) => "Resource not found.".to_string(),
        ApiError::Validation { message, errors, .. } => {
            if errors.is_empty() {
                return message.clone();
            }
            let fields: Vec<String> = errors
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
                .collect();
            format!("{} ({})", message, fields.join("; "))
        }
        ApiError::Http { status, .. } => match status {
            401 => "Authentication failed. Check your API key and token.".to_string(),
            403 => "Permission denied.".to_string(),
            409 => "Resource conflict. The resource may already exist or be in use.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 => "Invalid request. Check your parameters.".to_string(),
            s if *s >= 500 => "Backend temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed.".to_string(),
        },
    }
}
