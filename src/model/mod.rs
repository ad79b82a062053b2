//! Model abstraction layer
//!
//! This module provides a data-driven approach to managing backend resources.
//! Model definitions are loaded from JSON files at compile time, allowing
//! new resource types to be added without code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches model definitions from embedded JSON
//! - [`transform`] - Named field coercions applied to outgoing payloads
//! - [`query`] - List parameters and their query-string flattening
//! - [`normalize`] - Maps heterogeneous list responses to one [`ListResult`]
//!
//! # Model Definitions
//!
//! Models are defined in JSON files under `src/models/`:
//! - `catalog.json` - categories, attributes, options, products
//! - `customers.json` - clients, stores, users

pub mod fields;
pub mod normalize;
pub mod query;
pub mod registry;
pub mod transform;

pub use fields::{extract_json_value, has_id, item_id};
pub use normalize::{detect_shape, normalize_item, normalize_list, ListResult, ResponseShape};
pub use query::{payload_query, Filters, ListParams, PageRequest, RESERVED_PARAMS};
pub use registry::*;
pub use transform::{Transform, TransformError};
