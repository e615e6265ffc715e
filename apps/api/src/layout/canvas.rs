//! Drawing surface the document layout writes to.
//!
//! Coordinates are millimetres with the origin at the top-left of the page and
//! `y` growing downwards; text `y` is the baseline. Backends convert to their
//! own coordinate system.

use crate::layout::font_metrics::FontWeight;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub weight: FontWeight,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(font_size: f32, weight: FontWeight, color: Rgb) -> Self {
        Self {
            font_size,
            weight,
            color,
        }
    }
}

pub trait Canvas {
    /// Starts a new page; subsequent drawing lands on it.
    fn new_page(&mut self);
    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb);
    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb);
    /// Draws the `index`-th submitted image with its top-left corner at `(x, y)`.
    fn image(&mut self, index: usize, x: f32, y: f32, width: f32, height: f32);
}
