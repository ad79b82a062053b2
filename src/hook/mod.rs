//! Generic Resource Hook
//!
//! [`ResourceHook`] binds one shared [`Container`] to the surface every view
//! programs against: `data`, `loading`, `errors`, `filters`, `actions`,
//! `utils` and `meta`. It adds two behaviours on top of the container:
//!
//! - mount-time auto-fetch, fired at most once per container
//! - opt-in optimistic updates with rollback to the call-time snapshot
//!
//! Actions return the operation's error to the caller *and* leave it in
//! shared state, so observers that did not await the call still see it.

pub mod views;

use crate::api::ApiError;
use crate::model::{has_id, Filters, HttpMethod, ListParams, ListResult, Sort};
use crate::store::{Container, Store};
use serde_json::Value;
use std::sync::Arc;

pub use views::{DataView, ErrorsView, FiltersView, LoadingView, MetaView, Pagination};

/// How a hook behaves on mount and on update
#[derive(Debug, Clone)]
pub struct HookOptions {
    /// Base parameters for auto-fetch and `refetch`
    pub fetch_params: ListParams,
    pub auto_fetch: bool,
    pub optimistic_updates: bool,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            fetch_params: ListParams::default(),
            auto_fetch: true,
            optimistic_updates: false,
        }
    }
}

impl HookOptions {
    pub fn with_fetch_params(mut self, params: ListParams) -> Self {
        self.fetch_params = params;
        self
    }

    pub fn with_auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    pub fn with_optimistic_updates(mut self, optimistic: bool) -> Self {
        self.optimistic_updates = optimistic;
        self
    }
}

/// View-facing binding of one resource container
#[derive(Clone)]
pub struct ResourceHook {
    container: Arc<Container>,
    options: HookOptions,
}

impl ResourceHook {
    pub fn new(container: Arc<Container>, options: HookOptions) -> Self {
        Self { container, options }
    }

    /// Bind to the store's shared container for `name`
    pub fn from_store(store: &Store, name: &str, options: HookOptions) -> Self {
        Self::new(store.container(name), options)
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn options(&self) -> &HookOptions {
        &self.options
    }

    /// Mount-time auto-fetch. Fires `fetch_list(fetch_params)` only when the
    /// container is empty, not loading, and has never completed a fetch.
    /// Returns whether a fetch was made.
    pub async fn mount(&self) -> Result<bool, ApiError> {
        if !self.options.auto_fetch {
            return Ok(false);
        }
        if !self.container.try_claim_initial_fetch(&self.options.fetch_params) {
            tracing::debug!("{}: mount without fetch", self.container.name());
            return Ok(false);
        }

        tracing::debug!("{}: auto-fetch on mount", self.container.name());
        self.container
            .run_list(self.options.fetch_params.clone())
            .await?;
        Ok(true)
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn data(&self) -> DataView {
        self.container.read(|s| DataView::from(s))
    }

    pub fn loading(&self) -> LoadingView {
        self.container.read(|s| LoadingView::from(s))
    }

    pub fn errors(&self) -> ErrorsView {
        self.container.read(|s| ErrorsView::from(s))
    }

    pub fn filters(&self) -> FiltersView {
        self.container.read(|s| FiltersView {
            current_filters: s.current_filters.clone(),
            current_sort: s.current_sort.clone(),
        })
    }

    pub fn meta(&self) -> MetaView {
        let config = self.container.config();
        self.container.read(|s| MetaView {
            name: config.name.clone(),
            display_name: config.display_name.clone(),
            last_fetch: s.last_fetch,
            last_update: s.last_update,
        })
    }

    pub fn set_filters(&self, filters: Filters) {
        self.container.set_filters(filters);
    }

    pub fn set_sort(&self, sort: Option<Sort>) {
        self.container.set_sort(sort);
    }

    // =========================================================================
    // Actions
    // =========================================================================

    pub async fn fetch_list(&self, params: ListParams) -> Result<ListResult, ApiError> {
        self.container.fetch_list(params).await
    }

    pub async fn fetch_by_id(&self, id: &str) -> Result<Value, ApiError> {
        self.container.fetch_by_id(id).await
    }

    pub async fn create(&self, payload: Value) -> Result<Value, ApiError> {
        self.container.create(payload).await
    }

    /// Update an item. With optimistic updates on, the transformed changes
    /// are merged into the cached item immediately; on failure the item is
    /// restored from the snapshot taken here, not re-read from the server.
    pub async fn update(&self, id: &str, changes: Value) -> Result<Value, ApiError> {
        let snapshot = if self.options.optimistic_updates && self.can_update() {
            let pending = self.container.config().apply_transforms(&changes);
            self.container.apply_patch(id, &pending)
        } else {
            None
        };

        let result = self.container.update(id, changes).await;

        if let (Err(err), Some(snapshot)) = (&result, &snapshot) {
            tracing::warn!(
                "{}: rolling back optimistic update of {}: {}",
                self.container.name(),
                id,
                err
            );
            self.container.restore(snapshot);
        }
        result
    }

    pub async fn remove(&self, id: &str) -> Result<Value, ApiError> {
        self.container.remove(id).await
    }

    /// Run a custom action, then re-fetch whatever the action declares it
    /// invalidates. Re-fetch failures land in state but do not fail the action.
    pub async fn custom_action(
        &self,
        action: &str,
        id: Option<&str>,
        payload: Option<Value>,
        method: Option<HttpMethod>,
    ) -> Result<Value, ApiError> {
        let result = self
            .container
            .custom_action(action, id, payload, method)
            .await?;

        let invalidates = self
            .container
            .config()
            .custom_action(action)
            .map(|def| def.invalidates)
            .unwrap_or_default();

        if invalidates.refetch_list() {
            if let Err(e) = self.refetch().await {
                tracing::warn!("{}: refetch after {} failed: {}", self.container.name(), action, e);
            }
        }
        // Only reload the detail item when it is the one being shown
        if let Some(id) = id.filter(|_| invalidates.refetch_item()) {
            let showing = self
                .container
                .read(|s| s.current_item.as_ref().is_some_and(|c| has_id(c, id)));
            if showing {
                if let Err(e) = self.fetch_by_id(id).await {
                    tracing::warn!("{}: reload of {} failed: {}", self.container.name(), id, e);
                }
            }
        }

        Ok(result)
    }

    /// Re-issue the list fetch with the stored filters and sort merged over
    /// the hook's base parameters
    pub async fn refetch(&self) -> Result<ListResult, ApiError> {
        let params = self.container.read(|s| {
            self.options
                .fetch_params
                .merged_with(&s.current_filters, s.current_sort.as_ref())
        });
        self.container.fetch_list(params).await
    }

    // =========================================================================
    // Utils
    // =========================================================================

    pub fn clear_errors(&self) {
        self.container.clear_errors();
    }

    pub fn clear_current_item(&self) {
        self.container.clear_current_item();
    }

    pub fn reset_state(&self) {
        self.container.reset();
    }

    pub fn find_item_by_id(&self, id: &str) -> Option<Value> {
        self.container.read(|s| s.find_item(id).cloned())
    }

    /// UI affordance only; not an authorization check
    pub fn can_create(&self) -> bool {
        self.container.config().can_create()
    }

    pub fn can_update(&self) -> bool {
        self.container.config().can_update()
    }

    pub fn can_delete(&self) -> bool {
        self.container.config().can_delete()
    }
}
