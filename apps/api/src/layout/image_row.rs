//! Image row sizing: all submitted images side by side in one row.
//!
//! Width is shared evenly (minus fixed gaps), height follows each image's
//! aspect ratio, and any image taller than the cap is clamped to the cap with
//! its width re-derived from the ratio. The row is as tall as its tallest image.

/// Horizontal gap between images, in mm.
pub const IMAGE_GAP: f32 = 4.0;
/// Maximum rendered image height, in mm.
pub const MAX_IMAGE_HEIGHT: f32 = 130.0;

/// Natural pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRow {
    pub sizes: Vec<ImageSize>,
    pub row_height: f32,
}

/// Computes the rendered size of each image for a row `available_width` mm wide.
pub fn layout_image_row(images: &[ImageDimensions], available_width: f32) -> ImageRow {
    if images.is_empty() {
        return ImageRow {
            sizes: Vec::new(),
            row_height: 0.0,
        };
    }

    let count = images.len() as f32;
    let width_per_image = (available_width - (count - 1.0) * IMAGE_GAP) / count;

    let sizes: Vec<ImageSize> = images
        .iter()
        .map(|dims| {
            let ratio = dims.height.max(1) as f32 / dims.width.max(1) as f32;
            let mut width = width_per_image;
            let mut height = width * ratio;
            if height > MAX_IMAGE_HEIGHT {
                height = MAX_IMAGE_HEIGHT;
                width = height / ratio;
            }
            ImageSize { width, height }
        })
        .collect();

    let row_height = sizes.iter().map(|s| s.height).fold(0.0_f32, f32::max);

    ImageRow { sizes, row_height }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> ImageDimensions {
        ImageDimensions { width, height }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_square_and_wide_row_height_is_taller() {
        // 1:1 and 2:1 (width:height) sharing 170mm with one 4mm gap → 83mm each.
        let row = layout_image_row(&[dims(1000, 1000), dims(2000, 1000)], 170.0);
        assert!(close(row.sizes[0].width, 83.0));
        assert!(close(row.sizes[0].height, 83.0));
        assert!(close(row.sizes[1].width, 83.0));
        assert!(close(row.sizes[1].height, 41.5));
        assert!(close(row.row_height, 83.0));
    }

    #[test]
    fn test_heights_over_cap_rescale_width_by_own_ratio() {
        // Portrait 1:2 and 1:3 images both exceed the cap at 83mm wide.
        let row = layout_image_row(&[dims(500, 1000), dims(400, 1200)], 170.0);
        assert!(close(row.sizes[0].height, MAX_IMAGE_HEIGHT));
        assert!(close(row.sizes[0].width, 65.0));
        assert!(close(row.sizes[1].height, MAX_IMAGE_HEIGHT));
        assert!(close(row.sizes[1].width, 130.0 / 3.0));
        assert!(close(row.row_height, MAX_IMAGE_HEIGHT));
    }

    #[test]
    fn test_single_square_image_is_capped() {
        let row = layout_image_row(&[dims(800, 800)], 170.0);
        assert!(close(row.sizes[0].width, 130.0));
        assert!(close(row.sizes[0].height, 130.0));
    }

    #[test]
    fn test_three_images_share_width_with_gaps() {
        let row = layout_image_row(&[dims(300, 100); 3], 170.0);
        for size in &row.sizes {
            assert!(close(size.width, (170.0 - 8.0) / 3.0));
        }
        assert!(close(row.row_height, 18.0));
    }

    #[test]
    fn test_empty_row() {
        let row = layout_image_row(&[], 170.0);
        assert!(row.sizes.is_empty());
        assert_eq!(row.row_height, 0.0);
    }
}
