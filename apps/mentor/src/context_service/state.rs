use std::sync::Arc;

use crate::context_service::store::ContextStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, in-memory for tests and local runs.
    pub store: Arc<dyn ContextStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }
}
