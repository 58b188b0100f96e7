//! Application state management

use std::sync::Arc;

use crate::config::{Config, Environment};
use crate::lifecycle::Lifecycle;
use crate::store::RecordStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn RecordStore>,
    lifecycle: Lifecycle,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>, lifecycle: Lifecycle) -> Self {
        Self {
            config: Arc::new(config),
            store,
            lifecycle,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn environment(&self) -> Environment {
        self.config.service.environment
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.config.service.name)
            .field("environment", &self.environment())
            .field("phase", &self.lifecycle.phase())
            .finish_non_exhaustive()
    }
}
