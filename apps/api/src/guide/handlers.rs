//! Axum route handlers for the Guide API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::guide::model::GuideDocument;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateGuideRequest {
    #[serde(default)]
    pub primary_image: Option<String>,
    #[serde(default)]
    pub artwork_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateGuideResponse {
    pub guide: GuideDocument,
}

/// POST /api/generate-guide
///
/// Generates the seven-section presentation guide for the primary image.
pub async fn handle_generate_guide(
    State(state): State<AppState>,
    payload: Result<Json<GenerateGuideRequest>, JsonRejection>,
) -> Result<Json<GenerateGuideResponse>, AppError> {
    let Json(request) = payload?;
    let primary_image = request
        .primary_image
        .filter(|img| !img.is_empty())
        .ok_or_else(|| AppError::Validation("Primary image is required".to_string()))?;

    let guide = state
        .guide_service
        .request_guide(&primary_image, request.artwork_text.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(GenerateGuideResponse { guide }))
}
