//! State container
//!
//! A [`Container`] owns one resource's [`ContainerState`] and runs the six
//! async operations against it. Each operation moves its own channel through
//! `idle -> loading -> succeeded|failed`; operations never wait on each
//! other, so whichever response lands last wins.
//!
//! Operations record every failure in state before handing the error back,
//! so observers that never awaited the call still see it.

use super::state::{ContainerState, ItemSnapshot, Operation, OperationError};
use crate::api::{ApiClient, ApiError};
use crate::model::{Filters, HttpMethod, ListParams, ListResult, ModelConfig, Sort};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// One resource's state machine
pub struct Container {
    config: Arc<ModelConfig>,
    api: ApiClient,
    state: watch::Sender<ContainerState>,
}

/// Build a container for `config`, talking to the backend through `api`
pub fn make_container(config: Arc<ModelConfig>, api: ApiClient) -> Container {
    let (state, _) = watch::channel(ContainerState::new(config.default_page_size));
    Container { config, api, state }
}

impl Container {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &Arc<ModelConfig> {
        &self.config
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> ContainerState {
        self.state.borrow().clone()
    }

    /// Read the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&ContainerState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Receiver notified after every transition
    pub fn subscribe(&self) -> watch::Receiver<ContainerState> {
        self.state.subscribe()
    }

    fn update_state(&self, f: impl FnOnce(&mut ContainerState)) {
        self.state.send_modify(f);
    }

    fn record_failure(&self, op: Operation, err: &ApiError) {
        tracing::warn!("{}: {} failed: {}", self.config.name, op.as_str(), err);
        let error = OperationError::from(err);
        self.update_state(|s| s.fail(op, error));
    }

    // =========================================================================
    // Async operations
    // =========================================================================

    /// Fetch one page and replace the cached list
    pub async fn fetch_list(&self, params: ListParams) -> Result<ListResult, ApiError> {
        self.update_state(|s| s.begin_list(&params.filters, params.sort.as_ref()));
        self.run_list(params).await
    }

    /// Atomically mark a list fetch as started if the container has never
    /// loaded: no items, no list in flight, no completed fetch.
    /// Returns whether the caller won the claim and must run the fetch.
    pub(crate) fn try_claim_initial_fetch(&self, params: &ListParams) -> bool {
        self.state.send_if_modified(|s| {
            let pristine = s.items.is_empty() && !s.list.is_loading() && s.last_fetch.is_none();
            if pristine {
                s.begin_list(&params.filters, params.sort.as_ref());
            }
            pristine
        })
    }

    /// Run a list fetch whose `begin` transition already happened
    pub(crate) async fn run_list(&self, params: ListParams) -> Result<ListResult, ApiError> {
        match self.api.list(&self.config, &params).await {
            Ok(result) => {
                let returned = result.clone();
                self.update_state(|s| s.list_succeeded(result));
                Ok(returned)
            }
            Err(err) => {
                self.record_failure(Operation::List, &err);
                Err(err)
            }
        }
    }

    /// Fetch one item into `current_item`
    pub async fn fetch_by_id(&self, id: &str) -> Result<Value, ApiError> {
        self.update_state(|s| s.begin(Operation::FetchById));
        match self.api.get(&self.config, id).await {
            Ok(item) => {
                self.update_state(|s| s.fetch_by_id_succeeded(item.clone()));
                Ok(item)
            }
            Err(err) => {
                self.record_failure(Operation::FetchById, &err);
                Err(err)
            }
        }
    }

    pub async fn create(&self, payload: Value) -> Result<Value, ApiError> {
        self.update_state(|s| s.begin(Operation::Create));
        match self.api.create(&self.config, &payload).await {
            Ok(item) => {
                self.update_state(|s| s.create_succeeded(item.clone()));
                Ok(item)
            }
            Err(err) => {
                self.record_failure(Operation::Create, &err);
                Err(err)
            }
        }
    }

    pub async fn update(&self, id: &str, changes: Value) -> Result<Value, ApiError> {
        self.update_state(|s| s.begin(Operation::Update));
        match self.api.update(&self.config, id, &changes).await {
            Ok(item) => {
                self.update_state(|s| s.update_succeeded(id, item.clone()));
                Ok(item)
            }
            Err(err) => {
                self.record_failure(Operation::Update, &err);
                Err(err)
            }
        }
    }

    pub async fn remove(&self, id: &str) -> Result<Value, ApiError> {
        self.update_state(|s| s.begin(Operation::Delete));
        match self.api.remove(&self.config, id).await {
            Ok(echo) => {
                self.update_state(|s| s.delete_succeeded(id));
                Ok(echo)
            }
            Err(err) => {
                self.record_failure(Operation::Delete, &err);
                Err(err)
            }
        }
    }

    /// Run a custom action. Cached items are not touched; see
    /// [`Invalidation`](crate::model::Invalidation) for what to re-fetch.
    pub async fn custom_action(
        &self,
        action: &str,
        id: Option<&str>,
        payload: Option<Value>,
        method: Option<HttpMethod>,
    ) -> Result<Value, ApiError> {
        self.update_state(|s| s.begin(Operation::CustomAction));
        match self
            .api
            .custom_action(&self.config, action, id, payload.as_ref(), method)
            .await
        {
            Ok(result) => {
                self.update_state(|s| s.custom_action_succeeded());
                Ok(result)
            }
            Err(err) => {
                self.record_failure(Operation::CustomAction, &err);
                Err(err)
            }
        }
    }

    // =========================================================================
    // Synchronous transitions
    // =========================================================================

    pub fn set_filters(&self, filters: Filters) {
        self.update_state(|s| s.set_filters(filters));
    }

    pub fn set_sort(&self, sort: Option<Sort>) {
        self.update_state(|s| s.set_sort(sort));
    }

    pub fn clear_errors(&self) {
        self.update_state(|s| s.clear_errors());
    }

    pub fn clear_current_item(&self) {
        self.update_state(|s| s.clear_current_item());
    }

    /// Back to the initial empty state
    pub fn reset(&self) {
        let page_size = self.config.default_page_size;
        self.state.send_replace(ContainerState::new(page_size));
        tracing::debug!("{}: state reset", self.config.name);
    }

    pub(crate) fn apply_patch(&self, id: &str, patch: &Value) -> Option<ItemSnapshot> {
        let mut snapshot = None;
        self.state.send_if_modified(|s| {
            snapshot = s.apply_patch(id, patch);
            snapshot.is_some()
        });
        snapshot
    }

    pub(crate) fn restore(&self, snapshot: &ItemSnapshot) {
        self.update_state(|s| s.restore(snapshot));
    }
}
