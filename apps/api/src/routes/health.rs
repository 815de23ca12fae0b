use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and which backends are configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "campus-api",
        "store": if state.config.database_url.is_some() { "postgres" } else { "memory" },
        "ai_configured": state.config.gemini_api_key.is_some(),
    }))
}
