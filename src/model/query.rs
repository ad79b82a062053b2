//! List query parameters
//!
//! [`ListParams`] is what views ask for; [`ListParams::to_query`] flattens it
//! into the backend's query-string convention.

use super::registry::{ModelConfig, Sort, SortOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Filter map; null values are dropped before sending
pub type Filters = BTreeMap<String, Value>;

/// Query keys owned by paging, sort and search; filters may not use them
pub const RESERVED_PARAMS: &[&str] = &["page", "per_page", "sort_by", "sort_order", "search"];

/// Parameters for a list request. Unset fields fall back to the model defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub sort: Option<Sort>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Filters,
}

/// Page and page size after defaults are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: super::registry::DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Sort::new(field, order));
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Page and page size with model defaults applied (never zero)
    pub fn page_request(&self, config: &ModelConfig) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            page_size: self
                .page_size
                .unwrap_or(config.default_page_size)
                .max(1),
        }
    }

    /// Sort with the model default applied
    pub fn effective_sort(&self, config: &ModelConfig) -> Sort {
        self.sort
            .clone()
            .unwrap_or_else(|| config.default_sort.clone())
    }

    /// Overlay stored filters and sort on top of these params.
    /// Stored filters win on key collisions; a stored sort replaces ours.
    pub fn merged_with(&self, filters: &Filters, sort: Option<&Sort>) -> Self {
        let mut merged = self.clone();
        for (key, value) in filters {
            merged.filters.insert(key.clone(), value.clone());
        }
        if let Some(sort) = sort {
            merged.sort = Some(sort.clone());
        }
        merged
    }

    /// Flatten into query pairs:
    /// `page`, `per_page`, `sort_by`, `sort_order`, `search`, then one pair
    /// per non-null filter in key order. Filters named after a reserved key
    /// are skipped.
    pub fn to_query(&self, config: &ModelConfig) -> Vec<(String, String)> {
        let page = self.page_request(config);
        let sort = self.effective_sort(config);

        let mut pairs = vec![
            ("page".to_string(), page.page.to_string()),
            ("per_page".to_string(), page.page_size.to_string()),
            ("sort_by".to_string(), sort.field),
            ("sort_order".to_string(), sort.order.as_str().to_string()),
        ];

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            pairs.push(("search".to_string(), query.to_string()));
        }

        for (key, value) in &self.filters {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                tracing::debug!("Ignoring filter on reserved parameter '{}'", key);
                continue;
            }
            if let Some(rendered) = render_filter_value(value) {
                pairs.push((key.clone(), rendered));
            }
        }

        pairs
    }
}

/// Flatten an object payload into query pairs for bodiless requests.
/// Values render like filters; non-objects yield nothing.
pub fn payload_query(payload: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = payload else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| render_filter_value(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Render one filter value; `None` means the filter is dropped
fn render_filter_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values.iter().filter_map(render_filter_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::registry::ModelConfig;
    use serde_json::json;

    fn config() -> ModelConfig {
        ModelConfig::conventional("categories")
    }

    fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_defaults_come_from_model() {
        let pairs = ListParams::new().to_query(&config());
        assert_eq!(lookup(&pairs, "page"), Some("1"));
        assert_eq!(lookup(&pairs, "per_page"), Some("10"));
        assert_eq!(lookup(&pairs, "sort_by"), Some("created_at"));
        assert_eq!(lookup(&pairs, "sort_order"), Some("desc"));
        assert_eq!(lookup(&pairs, "search"), None);
    }

    #[test]
    fn test_null_filters_are_dropped() {
        let params = ListParams::new()
            .filter("active", true)
            .filter("parent_id", Value::Null)
            .filter("ids", json!([1, null, 3]))
            .filter("tags", json!([]));

        let pairs = params.to_query(&config());
        assert_eq!(lookup(&pairs, "active"), Some("true"));
        assert_eq!(lookup(&pairs, "parent_id"), None);
        assert_eq!(lookup(&pairs, "ids"), Some("1,3"));
        assert_eq!(lookup(&pairs, "tags"), None);
    }

    #[test]
    fn test_reserved_filter_keys_are_not_duplicated() {
        let query = ListParams::new()
            .page(3)
            .filter("page", 9)
            .filter("search", "x")
            .filter("sort_by", "name")
            .filter("status", "active")
            .to_query(&config());

        let count = |key: &str| query.iter().filter(|(k, _)| k == key).count();
        assert_eq!(count("page"), 1);
        assert_eq!(count("sort_by"), 1);
        assert_eq!(count("search"), 0);
        assert!(query.contains(&("page".to_string(), "3".to_string())));
        assert!(query.contains(&("status".to_string(), "active".to_string())));
    }

    #[test]
    fn test_payload_query_flattens_objects() {
        let query = payload_query(&json!({"ids": [3, 1], "dry_run": true, "note": null}));
        assert_eq!(
            query,
            vec![
                ("dry_run".to_string(), "true".to_string()),
                ("ids".to_string(), "3,1".to_string()),
            ]
        );
        assert!(payload_query(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_blank_search_is_omitted() {
        let pairs = ListParams::new().search("   ").to_query(&config());
        assert_eq!(lookup(&pairs, "search"), None);

        let pairs = ListParams::new().search(" colch ").to_query(&config());
        assert_eq!(lookup(&pairs, "search"), Some("colch"));
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let page = ListParams::new().page(0).page_size(0).page_request(&config());
        assert_eq!(page, PageRequest { page: 1, page_size: 1 });
    }

    #[test]
    fn test_merged_with_prefers_stored_state() {
        let base = ListParams::new()
            .filter("active", true)
            .filter("store", 1)
            .sort("name", SortOrder::Asc);

        let mut stored = Filters::new();
        stored.insert("store".into(), json!(2));
        let stored_sort = Sort::new("position", SortOrder::Desc);

        let merged = base.merged_with(&stored, Some(&stored_sort));
        assert_eq!(merged.filters["active"], json!(true));
        assert_eq!(merged.filters["store"], json!(2));
        assert_eq!(merged.sort, Some(stored_sort));
    }
}
