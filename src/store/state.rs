//! Container state and its transitions
//!
//! All mutation of a resource's cached state goes through the methods on
//! [`ContainerState`]. They are synchronous and pure apart from timestamps,
//! which keeps the container's async code a thin wrapper around them.

use crate::api::{ApiError, ValidationErrors};
use crate::model::{has_id, item_id, Filters, ListResult, Sort};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Lifecycle of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// The six async operations a container runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    FetchById,
    Create,
    Update,
    Delete,
    CustomAction,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::List,
        Operation::FetchById,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::CustomAction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::FetchById => "fetch_by_id",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::CustomAction => "custom_action",
        }
    }
}

/// Error as stored in state: message plus raw status and field errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationError {
    pub message: String,
    pub status: Option<u16>,
    pub validation_errors: Option<ValidationErrors>,
}

impl From<&ApiError> for OperationError {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.message(),
            status: err.status(),
            validation_errors: err.validation_errors().cloned(),
        }
    }
}

/// Status and error of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub status: Status,
    pub error: Option<OperationError>,
}

impl Channel {
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}

/// Pre-patch copy of an item, taken for optimistic updates
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot {
    pub id: String,
    pub item: Option<Value>,
    pub current_item: Option<Value>,
}

/// Cached state of one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerState {
    pub items: Vec<Value>,
    pub current_item: Option<Value>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,

    /// Follows the most recently started or finished operation
    pub status: Status,
    pub list: Channel,
    pub fetch_by_id: Channel,
    pub create: Channel,
    pub update: Channel,
    pub delete: Channel,
    pub custom_action: Channel,

    pub current_filters: Filters,
    pub current_sort: Option<Sort>,

    pub last_fetch: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl ContainerState {
    /// Initial empty state
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            current_item: None,
            total: 0,
            page: 1,
            page_size: page_size.max(1),
            total_pages: 0,
            status: Status::Idle,
            list: Channel::default(),
            fetch_by_id: Channel::default(),
            create: Channel::default(),
            update: Channel::default(),
            delete: Channel::default(),
            custom_action: Channel::default(),
            current_filters: Filters::new(),
            current_sort: None,
            last_fetch: None,
            last_update: None,
        }
    }

    pub fn channel(&self, op: Operation) -> &Channel {
        match op {
            Operation::List => &self.list,
            Operation::FetchById => &self.fetch_by_id,
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
            Operation::CustomAction => &self.custom_action,
        }
    }

    fn channel_mut(&mut self, op: Operation) -> &mut Channel {
        match op {
            Operation::List => &mut self.list,
            Operation::FetchById => &mut self.fetch_by_id,
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
            Operation::CustomAction => &mut self.custom_action,
        }
    }

    pub fn is_any_loading(&self) -> bool {
        Operation::ALL.iter().any(|op| self.channel(*op).is_loading())
    }

    pub fn has_error(&self) -> bool {
        Operation::ALL.iter().any(|op| self.channel(*op).error.is_some())
    }

    pub fn find_item(&self, id: &str) -> Option<&Value> {
        self.items.iter().find(|item| has_id(item, id))
    }

    // =========================================================================
    // Operation lifecycle
    // =========================================================================

    /// `idle|... -> loading`; clears only this operation's previous error
    pub fn begin(&mut self, op: Operation) {
        let channel = self.channel_mut(op);
        channel.status = Status::Loading;
        channel.error = None;
        self.status = Status::Loading;
    }

    /// `loading -> failed`; the error lands in this operation's channel only
    pub fn fail(&mut self, op: Operation, error: OperationError) {
        let channel = self.channel_mut(op);
        channel.status = Status::Failed;
        channel.error = Some(error);
        self.status = Status::Failed;
    }

    fn succeed(&mut self, op: Operation) {
        self.channel_mut(op).status = Status::Succeeded;
        self.status = Status::Succeeded;
    }

    /// List start also records the filters and sort being requested.
    /// Both are replaced, so a fetch without a sort clears the stored one.
    pub fn begin_list(&mut self, filters: &Filters, sort: Option<&Sort>) {
        self.begin(Operation::List);
        self.current_filters = filters.clone();
        self.current_sort = sort.cloned();
    }

    /// Replace items and paging wholesale
    pub fn list_succeeded(&mut self, result: ListResult) {
        self.items = result.items;
        self.total = result.total;
        self.page = result.page;
        self.page_size = result.page_size;
        self.total_pages = result.total_pages;
        self.last_fetch = Some(Utc::now());
        self.succeed(Operation::List);
    }

    /// Overwrites only `current_item`
    pub fn fetch_by_id_succeeded(&mut self, item: Value) {
        self.current_item = Some(item);
        self.succeed(Operation::FetchById);
    }

    /// Prepend and bump the total. The new item shows first regardless of
    /// the active sort until the next list refresh.
    pub fn create_succeeded(&mut self, item: Value) {
        self.items.insert(0, item);
        self.total += 1;
        self.last_update = Some(Utc::now());
        self.succeed(Operation::Create);
    }

    /// Replace the matching item and `current_item`. A server reply with no
    /// `id` is merged over the existing item so identity is kept.
    pub fn update_succeeded(&mut self, id: &str, item: Value) {
        let replace = |existing: &Value| -> Value {
            if item_id(&item).is_some() {
                item.clone()
            } else {
                merge(existing, &item)
            }
        };

        for existing in self.items.iter_mut().filter(|i| has_id(i, id)) {
            *existing = replace(existing);
        }
        if let Some(current) = self.current_item.as_mut().filter(|c| has_id(c, id)) {
            *current = replace(current);
        }

        self.last_update = Some(Utc::now());
        self.succeed(Operation::Update);
    }

    /// Drop the item; `total` decrements only when something was removed
    /// and never goes below zero.
    pub fn delete_succeeded(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|item| !has_id(item, id));
        let removed = (before - self.items.len()) as u64;
        self.total = self.total.saturating_sub(removed);

        if self.current_item.as_ref().is_some_and(|c| has_id(c, id)) {
            self.current_item = None;
        }

        self.last_update = Some(Utc::now());
        self.succeed(Operation::Delete);
    }

    /// Items and `current_item` are left alone; callers re-fetch.
    pub fn custom_action_succeeded(&mut self) {
        self.last_update = Some(Utc::now());
        self.succeed(Operation::CustomAction);
    }

    // =========================================================================
    // Synchronous transitions
    // =========================================================================

    pub fn set_filters(&mut self, filters: Filters) {
        self.current_filters = filters;
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        self.current_sort = sort;
    }

    pub fn clear_errors(&mut self) {
        for op in Operation::ALL {
            self.channel_mut(op).error = None;
        }
    }

    pub fn clear_current_item(&mut self) {
        self.current_item = None;
    }

    /// Merge `patch` into the item and `current_item` with identity `id`,
    /// returning what they looked like before. `None` if nothing matched.
    pub fn apply_patch(&mut self, id: &str, patch: &Value) -> Option<ItemSnapshot> {
        let snapshot = ItemSnapshot {
            id: id.to_string(),
            item: self.find_item(id).cloned(),
            current_item: self.current_item.clone().filter(|c| has_id(c, id)),
        };
        if snapshot.item.is_none() && snapshot.current_item.is_none() {
            return None;
        }

        for existing in self.items.iter_mut().filter(|i| has_id(i, id)) {
            *existing = merge(existing, patch);
        }
        if let Some(current) = self.current_item.as_mut().filter(|c| has_id(c, id)) {
            *current = merge(current, patch);
        }

        Some(snapshot)
    }

    /// Put back what [`apply_patch`](Self::apply_patch) captured
    pub fn restore(&mut self, snapshot: &ItemSnapshot) {
        if let Some(item) = &snapshot.item {
            for existing in self.items.iter_mut().filter(|i| has_id(i, &snapshot.id)) {
                *existing = item.clone();
            }
        }
        if let Some(current) = &snapshot.current_item {
            if self
                .current_item
                .as_ref()
                .is_some_and(|c| has_id(c, &snapshot.id))
            {
                self.current_item = Some(current.clone());
            }
        }
    }
}

/// Shallow object merge; non-object patches replace the base
fn merge(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut out = base.clone();
            for (key, value) in patch {
                out.insert(key.clone(), value.clone());
            }
            Value::Object(out)
        }
        (_, patch) => patch.clone(),
    }
}
