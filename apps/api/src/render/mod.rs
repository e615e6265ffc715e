// Document export: image probing, layout and PDF serialisation.
// Decoding and layout are CPU-bound and run inside tokio::task::spawn_blocking.

pub mod handlers;
pub mod pdf;

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info};

use crate::guide::model::GuideDocument;
use crate::layout::document::DOCUMENT_TITLE;
use crate::layout::{lay_out_document, ImageDimensions};
use crate::models::submission::{ArtworkImage, ArtworkSubmission};
use crate::render::pdf::PdfCanvas;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to generate PDF: {0}")]
    Pdf(String),

    #[error("Export task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug, Error)]
enum ProbeError {
    #[error("could not decode image '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: ImageError,
    },

    #[error("image decode task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug)]
pub struct ExportedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("docent-guide-{}.pdf", now.timestamp_millis())
}

/// Decodes every image on the blocking pool, all at once, using the format
/// its data URL declared.
/// Fails as a whole if any single image cannot be decoded.
async fn decode_images(images: &[ArtworkImage]) -> Result<Vec<DynamicImage>, ProbeError> {
    let handles: Vec<_> = images
        .iter()
        .map(|img| {
            let bytes = img.bytes.clone();
            let name = img.display_name.clone();
            let format = ImageFormat::from_mime_type(&img.media_type);
            tokio::task::spawn_blocking(move || {
                let decoded = match format {
                    Some(format) => image::load_from_memory_with_format(&bytes, format),
                    None => image::load_from_memory(&bytes),
                };
                decoded.map_err(|source| ProbeError::Decode { name, source })
            })
        })
        .collect();

    let mut decoded = Vec::with_capacity(handles.len());
    for handle in handles {
        decoded.push(handle.await??);
    }
    Ok(decoded)
}

/// Lays out and serialises the guide document for one submission.
///
/// An image that fails to decode drops the whole image row; the text sections
/// still render.
pub async fn export_document(
    submission: ArtworkSubmission,
    guide: Option<GuideDocument>,
) -> Result<ExportedDocument, ExportError> {
    let decoded = match decode_images(submission.images()).await {
        Ok(images) => Some(images),
        Err(e) => {
            error!("Skipping image block in export: {e}");
            None
        }
    };
    let free_text = submission.free_text().map(str::to_string);

    let (bytes, summary) = tokio::task::spawn_blocking(move || {
        let dimensions: Option<Vec<ImageDimensions>> = decoded.as_ref().map(|images| {
            images
                .iter()
                .map(|img| ImageDimensions {
                    width: img.width(),
                    height: img.height(),
                })
                .collect()
        });

        let mut canvas = PdfCanvas::new(DOCUMENT_TITLE, decoded.unwrap_or_default())?;
        let summary = lay_out_document(
            &mut canvas,
            dimensions.as_deref(),
            free_text.as_deref(),
            guide.as_ref(),
        );
        let bytes = canvas.finish()?;
        Ok::<_, ExportError>((bytes, summary))
    })
    .await??;

    let filename = export_filename(Utc::now());
    info!(
        "Exported {} ({} pages, {} bytes)",
        filename,
        summary.page_count,
        bytes.len()
    );

    Ok(ExportedDocument {
        filename,
        bytes,
        page_count: summary.page_count,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::TimeZone;
    use std::io::Cursor;

    /// Encodes a solid-colour PNG of the given size.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 90, 60]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    fn artwork(bytes: Vec<u8>, name: &str) -> ArtworkImage {
        ArtworkImage {
            bytes: Bytes::from(bytes),
            media_type: "image/png".into(),
            display_name: name.into(),
        }
    }

    fn guide() -> GuideDocument {
        GuideDocument {
            overview: Some("Impression of a harbor at sunrise.".into()),
            talking_points: Some(vec!["Loose brushwork".into(), "Orange sun".into()]),
            discussion_questions: Some(vec!["What do you notice first?".into()]),
            presentation_flow: Some("Opening Hook (30 sec): Ask what time it is.".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_export_filename_uses_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(export_filename(now), "docent-guide-1700000000123.pdf");
    }

    #[tokio::test]
    async fn test_decode_images_reports_dimensions() {
        let images = vec![artwork(png_bytes(40, 20), "a"), artwork(png_bytes(10, 30), "b")];
        let decoded = decode_images(&images).await.unwrap();
        assert_eq!(decoded[0].dimensions(), (40, 20));
        assert_eq!(decoded[1].dimensions(), (10, 30));
    }

    #[tokio::test]
    async fn test_decode_images_fails_when_any_image_is_corrupt() {
        let images = vec![artwork(png_bytes(4, 4), "good"), artwork(vec![1, 2, 3], "bad")];
        let err = decode_images(&images).await.unwrap_err();
        assert!(err.to_string().contains("bad"), "{err}");
    }

    #[tokio::test]
    async fn test_decode_images_uses_declared_format() {
        let mut mislabelled = artwork(png_bytes(4, 4), "labelled.jpg");
        mislabelled.media_type = "image/jpeg".into();
        let err = decode_images(&[mislabelled]).await.unwrap_err();
        assert!(err.to_string().contains("labelled.jpg"), "{err}");
    }

    #[tokio::test]
    async fn test_export_document_produces_pdf() {
        let submission = ArtworkSubmission::new(
            vec![artwork(png_bytes(64, 48), "primary.png")],
            Some("Claude Monet, 1872".into()),
        )
        .unwrap();

        let doc = export_document(submission, Some(guide())).await.unwrap();
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert!(doc.filename.starts_with("docent-guide-"));
        assert!(doc.filename.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_export_document_skips_undecodable_images() {
        let submission =
            ArtworkSubmission::new(vec![artwork(b"not an image".to_vec(), "x.png")], None)
                .unwrap();

        let doc = export_document(submission, Some(guide())).await.unwrap();
        assert!(doc.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_document_paginates_long_guides() {
        let long = "The painter returned to this harbor again and again. ".repeat(120);
        let guide = GuideDocument {
            overview: Some(long.clone()),
            historical_context: Some(long),
            ..Default::default()
        };
        let submission =
            ArtworkSubmission::new(vec![artwork(png_bytes(8, 8), "p.png")], None).unwrap();

        let doc = export_document(submission, Some(guide)).await.unwrap();
        assert!(doc.page_count > 1);
    }
}
