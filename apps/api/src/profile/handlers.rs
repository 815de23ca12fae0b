//! Axum route handlers for students and classes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{AppError, AppJson};
use crate::models::class::ClassGroup;
use crate::models::student::Student;
use crate::profile::reconciler::{
    load_profile, new_student, profile_for, save, update_student, StudentEdit, StudentProfile,
};
use crate::profile::roster::require_class;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
}

/// GET /api/v1/students/:id
pub async fn handle_get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProfile>, AppError> {
    let profile = load_profile(state.store.as_ref(), id).await?;
    Ok(Json(profile))
}

/// POST /api/v1/students
pub async fn handle_create_student(
    State(state): State<AppState>,
    AppJson(request): AppJson<StudentEdit>,
) -> Result<(StatusCode, Json<StudentProfile>), AppError> {
    let student = new_student(&request)?;
    let saved = save(state.store.as_ref(), &student).await?;
    let profile = profile_for(state.store.as_ref(), saved).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PATCH /api/v1/students/:id
///
/// Applies a partial edit and returns the saved profile. Fields absent from
/// the body are left as they are.
pub async fn handle_update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(edit): AppJson<StudentEdit>,
) -> Result<Json<StudentProfile>, AppError> {
    let profile = update_student(state.store.as_ref(), id, &edit).await?;
    Ok(Json(profile))
}

/// GET /api/v1/classes
pub async fn handle_list_classes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassGroup>>, AppError> {
    Ok(Json(state.store.list_classes().await?))
}

/// POST /api/v1/classes
pub async fn handle_create_class(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateClassRequest>,
) -> Result<(StatusCode, Json<ClassGroup>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("class name cannot be empty".to_string()));
    }
    let class = ClassGroup {
        id: Uuid::new_v4(),
        name: name.to_string(),
    };
    let saved = state.store.save_class(&class).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/v1/classes/:id/students
pub async fn handle_list_class_students(
    State(state): State<AppState>,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<Student>>, AppError> {
    let class = require_class(state.store.as_ref(), class_id).await?;
    Ok(Json(state.store.list_students(class.id).await?))
}
