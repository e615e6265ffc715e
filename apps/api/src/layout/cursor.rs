//! Page geometry and the vertical layout cursor.

use serde::{Deserialize, Serialize};

/// A4 portrait in millimetres with uniform margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 20.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest `y` any block may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Current vertical position and page index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub y: f32,
    pub page: usize,
}

impl Cursor {
    pub fn at_top(geometry: &PageGeometry) -> Self {
        Self {
            y: geometry.margin,
            page: 0,
        }
    }

    /// True when a block of `height` starting at the cursor would cross the bottom margin.
    pub fn would_overflow(&self, height: f32, geometry: &PageGeometry) -> bool {
        self.y + height > geometry.bottom_limit()
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn next_page(&mut self, geometry: &PageGeometry) {
        self.page += 1;
        self.y = geometry.margin;
    }
}
