use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::parser::ParseError;
use crate::llm_client::attachment::AttachmentError;
use crate::llm_client::GatewayError;
use crate::profile::reconciler::ReconcileError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("AI service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(anyhow::Error),
}

/// JSON body extractor whose rejections use the `AppError` envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

// Stores report through anyhow; sqlx failures keep their own variant.
impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<sqlx::Error>() {
            Ok(db) => AppError::Database(db),
            Err(e) => AppError::Internal(e),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::ServiceUnavailable => {
                AppError::ServiceUnavailable("no API credential configured".to_string())
            }
            GatewayError::GenerationFailed(cause) => AppError::GenerationFailed(cause),
        }
    }
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::MalformedResponse(msg) => AppError::MalformedResponse(msg),
        }
    }
}

impl From<AttachmentError> for AppError {
    fn from(e: AttachmentError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<ReconcileError> for AppError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::NotFound(msg) => AppError::NotFound(msg),
            ReconcileError::Validation(msg) => AppError::Validation(msg),
            ReconcileError::SaveFailed(msg) => AppError::SaveFailed(msg),
            ReconcileError::Store(e) => AppError::from(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("AI service unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "The AI service is not configured".to_string(),
                )
            }
            AppError::GenerationFailed(msg) => {
                tracing::error!("Generation failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILED",
                    format!("The AI service could not complete the request: {msg}"),
                )
            }
            AppError::MalformedResponse(msg) => {
                tracing::error!("Malformed model response: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_RESPONSE",
                    "The AI service returned a response that could not be read".to_string(),
                )
            }
            AppError::SaveFailed(msg) => {
                tracing::error!("Save failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SAVE_FAILED",
                    format!("The record could not be saved: {msg}"),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_gateway_errors_map_to_distinct_statuses() {
        let unavailable = AppError::from(GatewayError::ServiceUnavailable).into_response();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let failed =
            AppError::from(GatewayError::GenerationFailed("timeout".into())).into_response();
        assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_malformed_response_is_bad_gateway() {
        let resp =
            AppError::from(ParseError::MalformedResponse("eof".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_reconcile_errors_map() {
        assert_eq!(
            AppError::from(ReconcileError::NotFound("x".into()))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ReconcileError::Validation("x".into()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ReconcileError::SaveFailed("x".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_sqlx_errors_behind_anyhow_become_database() {
        let err = AppError::from(anyhow::Error::from(sqlx::Error::RowNotFound));
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let store = ReconcileError::Store(anyhow::Error::from(sqlx::Error::PoolTimedOut));
        assert!(matches!(AppError::from(store), AppError::Database(_)));
    }

    #[test]
    fn test_other_store_errors_stay_internal() {
        let err = AppError::from(ReconcileError::Store(anyhow!("lock poisoned")));
        assert!(matches!(err, AppError::Internal(_)));
    }
}
