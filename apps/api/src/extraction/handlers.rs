//! Axum route handlers for the Extraction API.
//!
//! Every endpoint takes a multipart upload with the image in an `image` field.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::extractor::{extract_grades, extract_names};
use crate::extraction::parser::ExtractedGradeRecord;
use crate::llm_client::InlineAttachment;
use crate::profile::roster::{
    apply_grades, enroll_names, require_class, EnrollReport, GradeApplyReport,
};
use crate::state::AppState;

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct NamesResponse {
    pub names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GradesResponse {
    pub records: Vec<ExtractedGradeRecord>,
}

#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub names: Vec<String>,
    pub report: EnrollReport,
}

#[derive(Debug, Serialize)]
pub struct ApplyGradesResponse {
    pub records: Vec<ExtractedGradeRecord>,
    pub report: GradeApplyReport,
}

/// Pulls the `image` field out of a multipart body and encodes it.
async fn read_image(mut multipart: Multipart, max_bytes: usize) -> Result<InlineAttachment, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read image: {e}")))?;
        if bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "image is {} bytes; the limit is {max_bytes}",
                bytes.len()
            )));
        }
        return Ok(InlineAttachment::from_image(&bytes, content_type.as_deref())?);
    }
    Err(AppError::Validation(format!(
        "multipart field '{IMAGE_FIELD}' is required"
    )))
}

/// POST /api/v1/extract/names
pub async fn handle_extract_names(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<NamesResponse>, AppError> {
    let image = read_image(multipart, state.config.max_upload_bytes).await?;
    let names = extract_names(state.llm.as_ref(), image).await?;
    Ok(Json(NamesResponse { names }))
}

/// POST /api/v1/extract/grades
pub async fn handle_extract_grades(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GradesResponse>, AppError> {
    let image = read_image(multipart, state.config.max_upload_bytes).await?;
    let records = extract_grades(state.llm.as_ref(), image).await?;
    Ok(Json(GradesResponse { records }))
}

/// POST /api/v1/classes/:id/names
///
/// Extracts names and enrolls the ones not yet on the class roster.
pub async fn handle_enroll_from_image(
    State(state): State<AppState>,
    Path(class_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<EnrollResponse>, AppError> {
    // Checked before the upload is read so an unknown class never costs a model call.
    let class = require_class(state.store.as_ref(), class_id).await?;
    let image = read_image(multipart, state.config.max_upload_bytes).await?;
    let names = extract_names(state.llm.as_ref(), image).await?;
    let report = enroll_names(state.store.as_ref(), &class, &names).await?;
    Ok(Json(EnrollResponse { names, report }))
}

/// POST /api/v1/classes/:id/grades
///
/// Extracts grades and writes them onto matching students of the class.
pub async fn handle_apply_grades_from_image(
    State(state): State<AppState>,
    Path(class_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApplyGradesResponse>, AppError> {
    let class = require_class(state.store.as_ref(), class_id).await?;
    let image = read_image(multipart, state.config.max_upload_bytes).await?;
    let records = extract_grades(state.llm.as_ref(), image).await?;
    let report = apply_grades(state.store.as_ref(), &class, &records).await?;
    Ok(Json(ApplyGradesResponse { records, report }))
}
