//! Axum route handler for PDF export.

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::guide::model::GuideDocument;
use crate::models::submission::{ArtworkImage, ArtworkSubmission};
use crate::render::export_document;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportImage {
    pub data_url: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPdfRequest {
    #[serde(default)]
    pub images: Vec<ExportImage>,
    #[serde(default)]
    pub artwork_text: Option<String>,
    #[serde(default)]
    pub guide: Option<GuideDocument>,
}

/// POST /api/export-pdf
///
/// Renders the submitted images, notes and guide as a downloadable PDF.
pub async fn handle_export_pdf(
    payload: Result<Json<ExportPdfRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let images = request
        .images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            let name = img
                .name
                .clone()
                .unwrap_or_else(|| format!("image-{}", i + 1));
            ArtworkImage::from_data_url(&img.data_url, &name)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let submission = ArtworkSubmission::new(images, request.artwork_text)?;
    let document = export_document(submission, request.guide).await?;

    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}
