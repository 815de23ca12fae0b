//! Axum route handlers for the Content API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::content::generator::{generate_content, ContentKind, GeneratedContent};
use crate::errors::{AppError, AppJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

/// POST /api/v1/content/description
pub async fn handle_generate_description(
    State(state): State<AppState>,
    AppJson(request): AppJson<TopicRequest>,
) -> Result<Json<GeneratedContent>, AppError> {
    let content =
        generate_content(state.llm.as_ref(), ContentKind::Description, &request.topic).await?;
    Ok(Json(content))
}

/// POST /api/v1/content/quiz
pub async fn handle_generate_quiz(
    State(state): State<AppState>,
    AppJson(request): AppJson<TopicRequest>,
) -> Result<Json<GeneratedContent>, AppError> {
    let content = generate_content(state.llm.as_ref(), ContentKind::Quiz, &request.topic).await?;
    Ok(Json(content))
}
