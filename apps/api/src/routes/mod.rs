pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::content::handlers as content;
use crate::extraction::handlers as extraction;
use crate::profile::handlers as profile;
use crate::state::AppState;

/// Multipart framing on top of the raw image bytes.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        // Students & classes
        .route("/api/v1/students", post(profile::handle_create_student))
        .route(
            "/api/v1/students/:id",
            get(profile::handle_get_student).patch(profile::handle_update_student),
        )
        .route(
            "/api/v1/classes",
            get(profile::handle_list_classes).post(profile::handle_create_class),
        )
        .route(
            "/api/v1/classes/:id/students",
            get(profile::handle_list_class_students),
        )
        // Content generation
        .route(
            "/api/v1/content/description",
            post(content::handle_generate_description),
        )
        .route("/api/v1/content/quiz", post(content::handle_generate_quiz))
        // Extraction
        .route("/api/v1/extract/names", post(extraction::handle_extract_names))
        .route("/api/v1/extract/grades", post(extraction::handle_extract_grades))
        .route(
            "/api/v1/classes/:id/names",
            post(extraction::handle_enroll_from_image),
        )
        .route(
            "/api/v1/classes/:id/grades",
            post(extraction::handle_apply_grades_from_image),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
