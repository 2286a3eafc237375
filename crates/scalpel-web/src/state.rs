//! Shared application state for the web server.

use std::sync::Arc;

use scalpel_rag::Pipeline;

/// Shared state injected into every Axum handler.
/// The pipeline and its corpus store are read-only, so no locking is needed.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

pub type SharedState = Arc<AppState>;
