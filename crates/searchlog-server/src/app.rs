//! Shared handler state

use std::sync::Arc;

use searchlog_core::DebounceCoordinator;
use searchlog_observability::Metrics;

/// Application state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub coordinator: DebounceCoordinator,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(coordinator: DebounceCoordinator, metrics: Arc<Metrics>) -> Self {
        Self {
            coordinator,
            metrics,
        }
    }
}
