use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::guide::service::GuideError;
use crate::models::submission::SubmissionError;
use crate::render::ExportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every error renders as `{ "message": "..." }`, the shape the browser client
/// reads to show the failure to the docent.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Body that the `Json` extractor refused (bad JSON, wrong content type,
    /// over the size limit). Keeps the rejection's status code.
    #[error("Rejected request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Guide error: {0}")]
    Guide(#[from] GuideError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Body(rejection) => (rejection.status(), rejection.body_text()),
            AppError::Guide(GuideError::InvalidInput(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Guide(e) => {
                tracing::error!("Guide error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
