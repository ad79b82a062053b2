//! Request credentials
//!
//! Holds the static API key and the swappable bearer token attached to every
//! backend request. Session lifecycle (login, refresh) lives outside this
//! crate; callers push new tokens in with [`Credentials::set_token`].

use std::sync::Arc;
use tokio::sync::RwLock;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// API key plus bearer token, shared across clones
#[derive(Clone, Default)]
pub struct Credentials {
    api_key: Option<String>,
    token: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    /// Create credentials from an optional API key and bearer token
    pub fn new(api_key: Option<String>, token: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            token: Arc::new(RwLock::new(token.filter(|t| !t.is_empty()))),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Current bearer token
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replace the bearer token for all clones of these credentials
    pub async fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.token.write().await;
        *guard = Some(token.into());
        tracing::debug!("Bearer token replaced");
    }

    /// Drop the bearer token (e.g. after logout)
    pub async fn clear_token(&self) {
        let mut guard = self.token.write().await;
        *guard = None;
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secrets
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}
