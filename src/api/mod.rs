//! Backend API interaction module
//!
//! This module provides the core functionality for talking to the REST
//! backend: credentials, the HTTP transport, the generic resource client,
//! and the error taxonomy every failure is normalized into.
//!
//! # Module Structure
//!
//! - [`auth`] - API key and bearer token attached to each request
//! - [`client`] - Generic API client for list/get/create/update/remove/actions
//! - [`error`] - [`ApiError`] taxonomy
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use catadmin::api::{ApiClient, Credentials};
//! use catadmin::model::{ListParams, ModelRegistry};
//!
//! async fn example() -> Result<(), catadmin::api::ApiError> {
//!     let client = ApiClient::new("https://shop.example/api", Credentials::default())?;
//!     let categories = ModelRegistry::builtin().get_config("categories");
//!     let page = client.list(&categories, &ListParams::new().page(2)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;

pub use auth::Credentials;
pub use client::{format_api_error, ApiClient, RetryPolicy};
pub use error::{ApiError, ValidationErrors};
