//! Derived, read-only views over a container's state

use crate::model::{Filters, Sort};
use crate::store::{ContainerState, Operation, OperationError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataView {
    pub items: Vec<Value>,
    pub current_item: Option<Value>,
    pub total: u64,
    pub pagination: Pagination,
    pub is_empty: bool,
}

impl From<&ContainerState> for DataView {
    fn from(s: &ContainerState) -> Self {
        Self {
            items: s.items.clone(),
            current_item: s.current_item.clone(),
            total: s.total,
            pagination: Pagination {
                page: s.page,
                page_size: s.page_size,
                total_pages: s.total_pages,
                has_next: s.page < s.total_pages,
                has_prev: s.page > 1,
            },
            is_empty: s.items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadingView {
    pub is_list_loading: bool,
    pub is_create_loading: bool,
    pub is_update_loading: bool,
    pub is_delete_loading: bool,
    pub is_fetch_by_id_loading: bool,
    pub is_custom_action_loading: bool,
    pub is_any_loading: bool,
}

impl From<&ContainerState> for LoadingView {
    fn from(s: &ContainerState) -> Self {
        Self {
            is_list_loading: s.list.is_loading(),
            is_create_loading: s.create.is_loading(),
            is_update_loading: s.update.is_loading(),
            is_delete_loading: s.delete.is_loading(),
            is_fetch_by_id_loading: s.fetch_by_id.is_loading(),
            is_custom_action_loading: s.custom_action.is_loading(),
            is_any_loading: s.is_any_loading(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorsView {
    pub list_error: Option<OperationError>,
    pub create_error: Option<OperationError>,
    pub update_error: Option<OperationError>,
    pub delete_error: Option<OperationError>,
    pub fetch_by_id_error: Option<OperationError>,
    pub custom_action_error: Option<OperationError>,
    pub has_error: bool,
}

impl From<&ContainerState> for ErrorsView {
    fn from(s: &ContainerState) -> Self {
        let error = |op| s.channel(op).error.clone();
        Self {
            list_error: error(Operation::List),
            create_error: error(Operation::Create),
            update_error: error(Operation::Update),
            delete_error: error(Operation::Delete),
            fetch_by_id_error: error(Operation::FetchById),
            custom_action_error: error(Operation::CustomAction),
            has_error: s.has_error(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiltersView {
    pub current_filters: Filters,
    pub current_sort: Option<Sort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaView {
    pub name: String,
    pub display_name: String,
    pub last_fetch: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn on_page(page: u32, total_pages: u32) -> Pagination {
        let mut state = ContainerState::new(5);
        state.items = vec![json!({"id": 1})];
        state.page = page;
        state.total_pages = total_pages;
        DataView::from(&state).pagination
    }

    #[test]
    fn test_pagination_flags() {
        let first = on_page(1, 3);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let middle = on_page(2, 3);
        assert!(middle.has_next);
        assert!(middle.has_prev);

        let last = on_page(3, 3);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn test_empty_state_has_no_pages() {
        let view = DataView::from(&ContainerState::new(10));
        assert!(view.is_empty);
        assert!(!view.pagination.has_next);
        assert!(!view.pagination.has_prev);
        assert_eq!(view.pagination.page_size, 10);
    }
}
