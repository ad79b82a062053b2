//! Model Registry - Load model definitions from JSON
//!
//! Built-in model definitions are embedded at compile time. A user overlay
//! (JSON or YAML) can add or replace models at startup, so a new resource
//! needs no code changes. Names with no definition fall back to a
//! convention-based configuration derived from the name itself.

use super::transform::Transform;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Embedded model JSON files (compiled into the binary)
const MODEL_FILES: &[&str] = &[
    include_str!("../models/catalog.json"),
    include_str!("../models/customers.json"),
];

/// Sort field used by models with no explicit default
pub const DEFAULT_SORT_FIELD: &str = "created_at";

/// Page size used by models with no explicit default
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Errors raised while loading model definitions
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid model YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sort field and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// Endpoint templates; `{id}` is replaced with the encoded item id.
/// A `None` endpoint means the operation is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default)]
    pub list: Option<String>,
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub create: Option<String>,
    #[serde(default)]
    pub update: Option<String>,
    #[serde(default)]
    pub delete: Option<String>,
}

impl Endpoints {
    /// Conventional REST endpoints rooted at `base`
    pub fn conventional(base: &str) -> Self {
        let item = format!("{}/{{id}}", base);
        Self {
            list: Some(base.to_string()),
            get: Some(item.clone()),
            create: Some(base.to_string()),
            update: Some(item.clone()),
            delete: Some(item),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Cached state a custom action makes stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invalidation {
    #[default]
    None,
    List,
    Item,
    ListAndItem,
}

impl Invalidation {
    pub fn refetch_list(&self) -> bool {
        matches!(self, Self::List | Self::ListAndItem)
    }

    pub fn refetch_item(&self) -> bool {
        matches!(self, Self::Item | Self::ListAndItem)
    }
}

/// Custom (non-CRUD) action definition
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomActionDef {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub requires_id: bool,
    #[serde(default)]
    pub invalidates: Invalidation,
}

/// Column definition for table rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
}

/// Fully resolved configuration for one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub name: String,
    pub display_name: String,
    pub path: String,
    pub endpoints: Endpoints,
    pub transform_fields: BTreeMap<String, Transform>,
    pub required_fields: BTreeSet<String>,
    pub default_sort: Sort,
    pub default_page_size: u32,
    pub custom_actions: BTreeMap<String, CustomActionDef>,
    pub columns: Vec<ColumnDef>,
}

impl ModelConfig {
    /// Convention-based configuration for a name with no definition
    pub fn conventional(name: &str) -> Self {
        let path = format!("/{}", pluralize(name));
        Self {
            name: name.to_string(),
            display_name: humanize(name),
            endpoints: Endpoints::conventional(&path),
            path,
            transform_fields: BTreeMap::new(),
            required_fields: BTreeSet::new(),
            default_sort: Sort::new(DEFAULT_SORT_FIELD, SortOrder::Desc),
            default_page_size: DEFAULT_PAGE_SIZE,
            custom_actions: BTreeMap::new(),
            columns: Vec::new(),
        }
    }

    pub fn can_create(&self) -> bool {
        self.endpoints.create.is_some()
    }

    pub fn can_update(&self) -> bool {
        self.endpoints.update.is_some()
    }

    pub fn can_delete(&self) -> bool {
        self.endpoints.delete.is_some()
    }

    pub fn custom_action(&self, action: &str) -> Option<&CustomActionDef> {
        self.custom_actions.get(action)
    }

    /// Apply configured transforms to every present field.
    ///
    /// A failing transform keeps that field's original value; other fields
    /// are unaffected. Non-object data is returned unchanged.
    pub fn apply_transforms(&self, data: &Value) -> Value {
        let Value::Object(map) = data else {
            return data.clone();
        };

        let mut out = map.clone();
        for (field, transform) in &self.transform_fields {
            let Some(original) = map.get(field) else {
                continue;
            };
            match transform.apply(original) {
                Ok(value) => {
                    out.insert(field.clone(), value);
                }
                Err(e) => {
                    tracing::debug!("{}: keeping original {}: {}", self.name, field, e);
                }
            }
        }

        Value::Object(out)
    }

    /// Check required fields. Absent, null, and blank strings count as missing.
    pub fn validate_required(&self, data: &Value) -> ValidationResult {
        let missing_fields: Vec<String> = self
            .required_fields
            .iter()
            .filter(|field| match data.get(field.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .cloned()
            .collect();

        let message = if missing_fields.is_empty() {
            None
        } else {
            Some(format!("Missing required fields: {}", missing_fields.join(", ")))
        };

        ValidationResult {
            is_valid: missing_fields.is_empty(),
            missing_fields,
            message,
        }
    }
}

/// Outcome of [`ModelConfig::validate_required`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub missing_fields: Vec<String>,
    pub message: Option<String>,
}

/// Model definition as written in JSON/YAML
#[derive(Debug, Clone, Deserialize)]
struct ModelDef {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    endpoints: Option<Endpoints>,
    #[serde(default)]
    transform_fields: BTreeMap<String, Transform>,
    #[serde(default)]
    required_fields: BTreeSet<String>,
    #[serde(default)]
    default_sort: Option<Sort>,
    #[serde(default)]
    default_page_size: Option<u32>,
    #[serde(default)]
    custom_actions: BTreeMap<String, CustomActionDef>,
    #[serde(default)]
    columns: Vec<ColumnDef>,
}

impl ModelDef {
    fn into_config(self, name: &str) -> ModelConfig {
        let base = ModelConfig::conventional(name);
        let path = self.path.unwrap_or(base.path);
        let endpoints = self
            .endpoints
            .unwrap_or_else(|| Endpoints::conventional(&path));

        ModelConfig {
            name: name.to_string(),
            display_name: self.display_name.unwrap_or(base.display_name),
            path,
            endpoints,
            transform_fields: self.transform_fields,
            required_fields: self.required_fields,
            default_sort: self.default_sort.unwrap_or(base.default_sort),
            default_page_size: self
                .default_page_size
                .filter(|size| *size > 0)
                .unwrap_or(base.default_page_size),
            custom_actions: self.custom_actions,
            columns: self.columns,
        }
    }
}

/// Root structure of models/*.json
#[derive(Debug, Clone, Deserialize)]
struct ModelFile {
    #[serde(default)]
    models: HashMap<String, ModelDef>,
}

/// Mapping from resource name to its configuration
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelConfig>>,
}

/// Global built-in registry loaded from embedded JSON
static BUILTIN: OnceLock<ModelRegistry> = OnceLock::new();

impl ModelRegistry {
    /// The built-in registry (parses embedded JSON on first access)
    pub fn builtin() -> &'static ModelRegistry {
        BUILTIN.get_or_init(|| {
            Self::from_sources(MODEL_FILES)
                .unwrap_or_else(|e| panic!("Failed to parse embedded model JSON: {}", e))
        })
    }

    /// Build a registry from JSON documents; later documents win
    pub fn from_sources(sources: &[&str]) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for content in sources {
            let file: ModelFile = serde_json::from_str(content)?;
            registry.merge(file);
        }
        Ok(registry)
    }

    /// Merge a user overlay file (JSON, or YAML for `.yaml`/`.yml`).
    /// Returns the number of models added or replaced.
    pub fn load_overlay(&mut self, path: &Path) -> Result<usize, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let file: ModelFile = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        let count = file.models.len();
        self.merge(file);
        tracing::info!("Loaded {} model(s) from {}", count, path.display());
        Ok(count)
    }

    fn merge(&mut self, file: ModelFile) {
        for (name, def) in file.models {
            let config = def.into_config(&name);
            self.models.insert(name, Arc::new(config));
        }
    }

    /// Configuration for `name`. Never fails: unregistered names get the
    /// conventional configuration.
    pub fn get_config(&self, name: &str) -> Arc<ModelConfig> {
        match self.models.get(name) {
            Some(config) => Arc::clone(config),
            None => Arc::new(ModelConfig::conventional(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered model names, sorted (for autocomplete and listings)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// A copy of this registry with every write capability removed
    pub fn read_only(&self) -> Self {
        let models = self
            .models
            .iter()
            .map(|(name, config)| {
                let mut config = (**config).clone();
                strip_writes(&mut config);
                (name.clone(), Arc::new(config))
            })
            .collect();
        Self { models }
    }

    pub fn apply_transforms(&self, name: &str, data: &Value) -> Value {
        self.get_config(name).apply_transforms(data)
    }

    pub fn validate_required(&self, name: &str, data: &Value) -> ValidationResult {
        self.get_config(name).validate_required(data)
    }
}

fn strip_writes(config: &mut ModelConfig) {
    config.endpoints.create = None;
    config.endpoints.update = None;
    config.endpoints.delete = None;
    config.custom_actions.clear();
}

/// English pluralization good enough for REST collection names
pub fn pluralize(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with('s') && !lower.ends_with("ss") {
        return name.to_string();
    }
    if let Some(stem) = name.strip_suffix('y') {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    if ["ss", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", name);
    }
    format!("{}s", name)
}

/// "product_images" -> "Product images"
fn humanize(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = ModelRegistry::builtin();
        assert!(!registry.names().is_empty(), "Registry should have models");
    }

    #[test]
    fn test_categories_model_exists() {
        let registry = ModelRegistry::builtin();
        assert!(registry.contains("categories"));

        let config = registry.get_config("categories");
        assert_eq!(config.display_name, "Categories");
        assert!(config.required_fields.contains("name"));
        assert_eq!(config.transform_fields.get("active"), Some(&Transform::Boolean));
        assert_eq!(config.transform_fields.get("position"), Some(&Transform::Number));
        assert!(config.custom_action("activate").is_some());
    }

    #[test]
    fn test_unknown_model_uses_convention() {
        let registry = ModelRegistry::builtin();
        let config = registry.get_config("warehouse");

        assert_eq!(config.endpoints.list.as_deref(), Some("/warehouses"));
        assert_eq!(config.endpoints.get.as_deref(), Some("/warehouses/{id}"));
        assert_eq!(config.endpoints.delete.as_deref(), Some("/warehouses/{id}"));
        assert_eq!(config.default_sort, Sort::new("created_at", SortOrder::Desc));
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert!(config.transform_fields.is_empty());
        assert!(config.required_fields.is_empty());
        assert!(config.custom_actions.is_empty());
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("clients"), "clients");
        assert_eq!(pluralize("store"), "stores");
    }

    #[test]
    fn test_apply_transforms_coerces_present_fields() {
        let config = ModelRegistry::builtin().get_config("categories");
        let out = config.apply_transforms(&json!({"name": "Colchones", "active": "1", "position": "3"}));
        assert_eq!(out, json!({"name": "Colchones", "active": true, "position": 3}));
    }

    #[test]
    fn test_failed_transform_keeps_original_value() {
        let config = ModelRegistry::builtin().get_config("categories");
        let out = config.apply_transforms(&json!({"position": "first", "active": "yes"}));
        assert_eq!(out["position"], json!("first"));
        assert_eq!(out["active"], json!(true));
    }

    #[test]
    fn test_apply_transforms_ignores_non_objects() {
        let config = ModelRegistry::builtin().get_config("categories");
        assert_eq!(config.apply_transforms(&json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_validate_required_reports_missing() {
        let registry = ModelRegistry::from_sources(&[
            r#"{"models": {"tags": {"required_fields": ["name"]}}}"#,
        ])
        .unwrap();

        let result = registry.validate_required("tags", &json!({}));
        assert!(!result.is_valid);
        assert_eq!(result.missing_fields, vec!["name".to_string()]);
        assert_eq!(result.message.as_deref(), Some("Missing required fields: name"));

        let result = registry.validate_required("tags", &json!({"name": "  "}));
        assert!(!result.is_valid);

        let result = registry.validate_required("tags", &json!({"name": "sale"}));
        assert!(result.is_valid);
        assert!(result.message.is_none());
    }

    #[test]
    fn test_explicit_endpoints_disable_operations() {
        let registry = ModelRegistry::from_sources(&[r#"{
            "models": {
                "audit_logs": {
                    "endpoints": {"list": "/audit-logs", "get": "/audit-logs/{id}"}
                }
            }
        }"#])
        .unwrap();

        let config = registry.get_config("audit_logs");
        assert!(!config.can_create());
        assert!(!config.can_update());
        assert!(!config.can_delete());
        assert_eq!(config.display_name, "Audit logs");
    }

    #[test]
    fn test_read_only_strips_writes() {
        let registry = ModelRegistry::builtin().read_only();
        let config = registry.get_config("categories");
        assert!(config.endpoints.list.is_some());
        assert!(!config.can_create());
        assert!(!config.can_update());
        assert!(!config.can_delete());
        assert!(config.custom_actions.is_empty());
    }

    #[test]
    fn test_later_sources_win() {
        let registry = ModelRegistry::from_sources(&[
            r#"{"models": {"tags": {"display_name": "Tags"}}}"#,
            r#"{"models": {"tags": {"display_name": "Labels"}}}"#,
        ])
        .unwrap();
        assert_eq!(registry.get_config("tags").display_name, "Labels");
    }

    #[test]
    fn test_load_yaml_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.yaml");
        std::fs::write(
            &path,
            "models:\n  brands:\n    display_name: Brands\n    required_fields: [name]\n    transform_fields:\n      featured: boolean\n",
        )
        .unwrap();

        let mut registry = ModelRegistry::builtin().clone();
        assert_eq!(registry.load_overlay(&path).unwrap(), 1);

        let config = registry.get_config("brands");
        assert_eq!(config.display_name, "Brands");
        assert_eq!(config.endpoints.list.as_deref(), Some("/brands"));
        assert_eq!(config.transform_fields.get("featured"), Some(&Transform::Boolean));
        assert!(registry.contains("categories"));
    }

    #[test]
    fn test_load_overlay_missing_file() {
        let mut registry = ModelRegistry::default();
        let err = registry.load_overlay(Path::new("/nonexistent/models.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }
}
