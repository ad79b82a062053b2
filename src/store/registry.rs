//! Store - one container per resource name
//!
//! The store is built once at startup from a model registry and an API
//! client, then handed to whatever needs resource state. Containers are
//! created lazily on first use and live as long as the store.

use super::container::{make_container, Container};
use crate::api::ApiClient;
use crate::model::ModelRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub struct Store {
    models: ModelRegistry,
    api: ApiClient,
    containers: Mutex<HashMap<String, Arc<Container>>>,
}

impl Store {
    pub fn new(models: ModelRegistry, api: ApiClient) -> Self {
        Self {
            models,
            api,
            containers: Mutex::new(HashMap::new()),
        }
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Shared container for `name`, created on first use
    pub fn container(&self, name: &str) -> Arc<Container> {
        let mut containers = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let container = containers.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!("Creating container for {}", name);
            Arc::new(make_container(self.models.get_config(name), self.api.clone()))
        });
        Arc::clone(container)
    }

    /// Container for `name` only if one was already created
    pub fn existing(&self, name: &str) -> Option<Arc<Container>> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Names with a live container, sorted
    pub fn active_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Reset every live container to its initial state
    pub fn reset_all(&self) {
        let containers: Vec<Arc<Container>> = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for container in containers {
            container.reset();
        }
    }
}
