use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// At most three images per submission; the first is the primary.
pub const MAX_IMAGES: usize = 3;
/// Per-image cap on decoded size.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const ACCEPTED_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Invalid image data format")]
    InvalidDataUrl,

    #[error("Invalid base64 payload for image '{name}'")]
    InvalidBase64 { name: String },

    #[error("Invalid file type '{media_type}'. Please upload JPEG, PNG, or WebP images.")]
    UnsupportedMediaType { media_type: String },

    #[error("File '{name}' is too large. Maximum size is 10MB.")]
    TooLarge { name: String },

    #[error("At least one image is required")]
    NoImages,

    #[error("At most {MAX_IMAGES} images may be submitted, got {count}")]
    TooManyImages { count: usize },
}

// ────────────────────────────────────────────────────────────────────────────
// Data URLs
// ────────────────────────────────────────────────────────────────────────────

static DATA_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:(.+);base64,(.+)$").expect("data URL pattern is valid"));

/// A `data:<media-type>;base64,<payload>` string split into its parts.
/// The payload is not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub media_type: &'a str,
    pub payload: &'a str,
}

pub fn parse_data_url(input: &str) -> Result<DataUrl<'_>, SubmissionError> {
    let caps = DATA_URL_PATTERN
        .captures(input)
        .ok_or(SubmissionError::InvalidDataUrl)?;
    let (Some(media_type), Some(payload)) = (caps.get(1), caps.get(2)) else {
        return Err(SubmissionError::InvalidDataUrl);
    };
    Ok(DataUrl {
        media_type: media_type.as_str(),
        payload: payload.as_str(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Submission
// ────────────────────────────────────────────────────────────────────────────

/// One uploaded image, decoded from its data URL.
#[derive(Debug, Clone)]
pub struct ArtworkImage {
    pub bytes: Bytes,
    pub media_type: String,
    pub display_name: String,
}

impl ArtworkImage {
    /// Decodes and validates a data URL: accepted media type, valid base64,
    /// and at most `MAX_IMAGE_BYTES` once decoded.
    pub fn from_data_url(data_url: &str, display_name: &str) -> Result<Self, SubmissionError> {
        let parsed = parse_data_url(data_url)?;

        if !ACCEPTED_MEDIA_TYPES.contains(&parsed.media_type) {
            return Err(SubmissionError::UnsupportedMediaType {
                media_type: parsed.media_type.to_string(),
            });
        }

        let bytes = STANDARD
            .decode(parsed.payload)
            .map_err(|_| SubmissionError::InvalidBase64 {
                name: display_name.to_string(),
            })?;

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(SubmissionError::TooLarge {
                name: display_name.to_string(),
            });
        }

        Ok(Self {
            bytes: Bytes::from(bytes),
            media_type: parsed.media_type.to_string(),
            display_name: display_name.to_string(),
        })
    }
}

/// Images plus the docent's optional notes. Lives for one request only.
#[derive(Debug, Clone)]
pub struct ArtworkSubmission {
    images: Vec<ArtworkImage>,
    free_text: Option<String>,
}

impl ArtworkSubmission {
    pub fn new(
        images: Vec<ArtworkImage>,
        free_text: Option<String>,
    ) -> Result<Self, SubmissionError> {
        if images.is_empty() {
            return Err(SubmissionError::NoImages);
        }
        if images.len() > MAX_IMAGES {
            return Err(SubmissionError::TooManyImages {
                count: images.len(),
            });
        }
        let free_text = free_text.filter(|t| !t.trim().is_empty());
        Ok(Self { images, free_text })
    }

    pub fn images(&self) -> &[ArtworkImage] {
        &self.images
    }

    pub fn free_text(&self) -> Option<&str> {
        self.free_text.as_deref()
    }
}
