//! Response normalization
//!
//! The backend answers list requests in several shapes. Each shape has a
//! pure parser `(&Value, PageRequest) -> Option<ListResult>`; parsers are
//! tried in a fixed priority order and the first match wins. The last
//! parser accepts anything, so normalization is total.

use super::query::PageRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical result of any list operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    pub items: Vec<Value>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Recognized response shapes, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{data: {items: [...], pagination: {...}}}`
    EnvelopedPagination,
    /// `{data: [...], total, current_page, per_page, last_page}`
    FlatPagination,
    /// `{data: [...], meta: {total, current_page, per_page, last_page}}`
    ResourceCollection,
    /// `[...]` or `{data: [...]}` with no paging metadata
    BareArray,
    /// `null` / empty body
    Empty,
    /// Anything else, wrapped as a single item
    SingleObject,
}

type ShapeParser = fn(&Value, PageRequest) -> Option<ListResult>;

const PARSERS: &[(ResponseShape, ShapeParser)] = &[
    (ResponseShape::EnvelopedPagination, parse_enveloped),
    (ResponseShape::FlatPagination, parse_flat),
    (ResponseShape::ResourceCollection, parse_resource_collection),
    (ResponseShape::BareArray, parse_bare_array),
    (ResponseShape::Empty, parse_empty),
    (ResponseShape::SingleObject, parse_single),
];

const PAGINATION_KEYS: &[&str] = &["total", "current_page", "per_page", "last_page"];

/// Normalize a raw list response. `requested` fills paging fields the
/// response does not carry.
pub fn normalize_list(raw: &Value, requested: PageRequest) -> ListResult {
    detect(raw, requested).1
}

/// Which shape `raw` was recognized as
pub fn detect_shape(raw: &Value) -> ResponseShape {
    detect(raw, PageRequest::default()).0
}

fn detect(raw: &Value, requested: PageRequest) -> (ResponseShape, ListResult) {
    for (shape, parser) in PARSERS {
        if let Some(result) = parser(raw, requested) {
            return (*shape, result);
        }
    }
    // parse_single accepts every input
    (ResponseShape::SingleObject, ListResult::default())
}

/// Unwrap a single-item response from a `{data: {...}}` envelope.
/// Objects that carry their own `id` are never unwrapped.
pub fn normalize_item(raw: Value) -> Value {
    match raw {
        Value::Object(mut map) if !map.contains_key("id") => match map.remove("data") {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                map.insert("data".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Paging metadata as found in the response, any field possibly missing
#[derive(Debug, Default)]
struct PageMeta {
    total: Option<u64>,
    current_page: Option<u32>,
    per_page: Option<u32>,
    last_page: Option<u32>,
}

impl PageMeta {
    fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            total: lenient_u64(map.get("total")),
            current_page: lenient_u64(map.get("current_page")).map(saturate_u32),
            per_page: lenient_u64(map.get("per_page")).map(saturate_u32),
            last_page: lenient_u64(map.get("last_page")).map(saturate_u32),
        }
    }

    fn finish(self, items: Vec<Value>, requested: PageRequest) -> ListResult {
        let len = items.len() as u64;
        let total = self.total.unwrap_or(len).max(len);
        let page = self.current_page.unwrap_or(requested.page).max(1);
        let page_size = self
            .per_page
            .unwrap_or(requested.page_size)
            .max(saturate_u32(len))
            .max(1);
        let total_pages = self
            .last_page
            .unwrap_or_else(|| saturate_u32(total.div_ceil(u64::from(page_size))));

        ListResult {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// Accept numbers and numeric strings
fn lenient_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn saturate_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn parse_enveloped(raw: &Value, requested: PageRequest) -> Option<ListResult> {
    let data = raw.get("data")?.as_object()?;
    let items = data.get("items")?.as_array()?;
    let meta = data
        .get("pagination")
        .and_then(|p| p.as_object())
        .map(PageMeta::from_object)
        .unwrap_or_default();
    Some(meta.finish(items.clone(), requested))
}

fn parse_flat(raw: &Value, requested: PageRequest) -> Option<ListResult> {
    let map = raw.as_object()?;
    let items = map.get("data")?.as_array()?;
    if !PAGINATION_KEYS.iter().any(|k| map.contains_key(*k)) {
        return None;
    }
    Some(PageMeta::from_object(map).finish(items.clone(), requested))
}

fn parse_resource_collection(raw: &Value, requested: PageRequest) -> Option<ListResult> {
    let items = raw.get("data")?.as_array()?;
    let meta = raw.get("meta")?.as_object()?;
    Some(PageMeta::from_object(meta).finish(items.clone(), requested))
}

fn parse_bare_array(raw: &Value, requested: PageRequest) -> Option<ListResult> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(map) => map.get("data")?.as_array()?,
        _ => return None,
    };
    let meta = PageMeta {
        current_page: Some(1),
        ..PageMeta::default()
    };
    Some(meta.finish(items.clone(), requested))
}

fn parse_empty(raw: &Value, requested: PageRequest) -> Option<ListResult> {
    if !raw.is_null() {
        return None;
    }
    Some(PageMeta::default().finish(Vec::new(), requested))
}

fn parse_single(raw: &Value, requested: PageRequest) -> Option<ListResult> {
    let meta = PageMeta {
        current_page: Some(1),
        last_page: Some(1),
        ..PageMeta::default()
    };
    Some(meta.finish(vec![raw.clone()], requested))
}
