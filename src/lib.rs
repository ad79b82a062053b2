//! catadmin - admin console core for catalog and customer data
//!
//! Dozens of unrelated resources share one state and networking
//! implementation, driven entirely by declarative per-resource models:
//!
//! - [`model`] - Model Registry, transforms, list queries, response normalization
//! - [`api`] - Generic API client and error taxonomy
//! - [`store`] - Per-resource state containers and the [`store::Store`] registry
//! - [`hook`] - [`hook::ResourceHook`], the surface views program against
//!
//! Adding a resource only needs a new model definition.

pub mod api;
pub mod config;
pub mod hook;
pub mod model;
pub mod store;
