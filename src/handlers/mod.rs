pub mod entries;
pub mod health;
pub mod metrics_handler;
pub mod pricing;

use crate::session::SessionStore;
use std::sync::Arc;

/// Shared state for the `/api` handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }
}
