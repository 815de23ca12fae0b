use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::store::StudentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL when `DATABASE_URL` is set, in-memory otherwise.
    pub store: Arc<dyn StudentStore>,
    /// The model gateway. `LlmClient` in production.
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
}
