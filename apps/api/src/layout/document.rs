//! Document layout: emits the guide onto a `Canvas`, page by page.
//!
//! # Pagination
//! Every emitter computes the height of its next block and calls
//! `ensure_room` before drawing it. That is the only place a page break can
//! happen. Paragraph text is checked one wrapped line at a time, so long
//! paragraphs flow across pages; list items, questions and flow steps are
//! checked as whole blocks and never split.
//!
//! # Order
//! Title, image row (primary labelled), sections 1–7 in order (each omitted
//! when empty), the docent's notes, then a footer on the last page.

use crate::guide::model::{GuideDocument, PresentationStep};
use crate::layout::canvas::{Canvas, Rgb, TextStyle};
use crate::layout::cursor::{Cursor, PageGeometry};
use crate::layout::font_metrics::{get_metrics, FontWeight};
use crate::layout::image_row::{layout_image_row, ImageDimensions, IMAGE_GAP};

pub const DOCUMENT_TITLE: &str = "Docent Presentation Guide";
pub const FOOTER_TEXT: &str = "Generated by Art Docent Guide";
pub const PRIMARY_LABEL: &str = "Primary";

const BODY_FONT_SIZE: f32 = 11.0;
/// Fixed line advance for questions and flow steps.
const COMPACT_LINE_ADVANCE: f32 = 5.0;

const TITLE_COLOR: Rgb = Rgb(28, 25, 23);
const HEADING_COLOR: Rgb = Rgb(41, 37, 36);
const BODY_COLOR: Rgb = Rgb(87, 83, 78);
const MUTED_COLOR: Rgb = Rgb(68, 64, 60);
const QUESTION_LABEL_COLOR: Rgb = Rgb(120, 113, 108);
const MARKER_COLOR: Rgb = Rgb(168, 162, 158);
const BADGE_COLOR: Rgb = Rgb(245, 245, 244);
const RULE_COLOR: Rgb = Rgb(214, 211, 209);
const WHITE: Rgb = Rgb(255, 255, 255);

/// Vertical space consumed by one wrapped line at `font_size`, excluding the 1mm leading.
pub fn line_height(font_size: f32) -> f32 {
    font_size * 0.4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    pub page_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Layout state
// ────────────────────────────────────────────────────────────────────────────

pub struct DocumentLayout<'c, C: Canvas> {
    canvas: &'c mut C,
    geometry: PageGeometry,
    cursor: Cursor,
}

impl<'c, C: Canvas> DocumentLayout<'c, C> {
    pub fn new(canvas: &'c mut C) -> Self {
        let geometry = PageGeometry::A4;
        Self {
            canvas,
            geometry,
            cursor: Cursor::at_top(&geometry),
        }
    }

    /// Starts from an arbitrary cursor position on the first page.
    #[cfg(test)]
    pub fn starting_at(canvas: &'c mut C, y: f32) -> Self {
        let mut layout = Self::new(canvas);
        layout.cursor.y = y;
        layout
    }

    #[cfg(test)]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Breaks to a new page if a block of `height` does not fit below the cursor.
    pub fn ensure_room(&mut self, height: f32) -> bool {
        if self.cursor.would_overflow(height, &self.geometry) {
            self.canvas.new_page();
            self.cursor.next_page(&self.geometry);
            true
        } else {
            false
        }
    }

    fn margin(&self) -> f32 {
        self.geometry.margin
    }

    fn content_width(&self) -> f32 {
        self.geometry.content_width()
    }

    fn wrap(&self, text: &str, font_size: f32, weight: FontWeight, width: f32) -> Vec<String> {
        get_metrics(weight).wrap_text(text, font_size, width)
    }

    // ── Emitters ─────────────────────────────────────────────────────────────

    pub fn title(&mut self) {
        let x = self.margin();
        let y = self.cursor.y;
        self.canvas.text(
            DOCUMENT_TITLE,
            x,
            y,
            TextStyle::new(24.0, FontWeight::Bold, TITLE_COLOR),
        );
        self.cursor.advance(15.0);
    }

    /// All images in one row; the first is labelled as the primary image.
    pub fn image_row(&mut self, images: &[ImageDimensions]) {
        if images.is_empty() {
            return;
        }
        let row = layout_image_row(images, self.content_width());

        self.ensure_room(row.row_height + 15.0);

        let margin = self.margin();
        let y = self.cursor.y;
        self.canvas.fill_rect(margin, y - 5.0, 25.0, 6.0, HEADING_COLOR);
        self.canvas.text(
            PRIMARY_LABEL,
            margin + 3.0,
            y - 1.0,
            TextStyle::new(9.0, FontWeight::Bold, WHITE),
        );
        self.cursor.advance(3.0);

        let top = self.cursor.y;
        let mut x = margin;
        for (index, size) in row.sizes.iter().enumerate() {
            self.canvas.image(index, x, top, size.width, size.height);
            x += size.width + IMAGE_GAP;
        }

        self.cursor.advance(row.row_height + 10.0);
    }

    /// Numbered badge plus bold section title.
    pub fn section_header(&mut self, number: usize, title: &str) {
        self.cursor.advance(8.0);
        self.ensure_room(15.0);

        let margin = self.margin();
        let y = self.cursor.y;
        self.canvas.fill_circle(margin + 4.0, y - 2.0, 4.0, BADGE_COLOR);
        self.canvas.text(
            &number.to_string(),
            margin + 2.5,
            y,
            TextStyle::new(10.0, FontWeight::Normal, MUTED_COLOR),
        );
        self.canvas.text(
            title,
            margin + 12.0,
            y,
            TextStyle::new(14.0, FontWeight::Bold, HEADING_COLOR),
        );
        self.cursor.advance(8.0);
    }

    /// Wrapped paragraph; each line is checked for room on its own.
    pub fn paragraph(&mut self, text: &str, font_size: f32, weight: FontWeight, color: Rgb) {
        let lines = self.wrap(text, font_size, weight, self.content_width());
        let lh = line_height(font_size);
        let style = TextStyle::new(font_size, weight, color);

        for line in &lines {
            self.ensure_room(lh + 2.0);
            let (x, y) = (self.margin(), self.cursor.y);
            self.canvas.text(line, x, y, style);
            self.cursor.advance(lh + 1.0);
        }
        self.cursor.advance(3.0);
    }

    pub fn body_text(&mut self, text: &str) {
        self.paragraph(text, BODY_FONT_SIZE, FontWeight::Normal, BODY_COLOR);
    }

    /// Bulleted list; each item is kept whole on one page.
    pub fn bullet_list(&mut self, items: &[String]) {
        let lh = line_height(BODY_FONT_SIZE);
        let style = TextStyle::new(BODY_FONT_SIZE, FontWeight::Normal, BODY_COLOR);
        let width = self.content_width() - 8.0;

        for item in items {
            let lines = self.wrap(item, BODY_FONT_SIZE, FontWeight::Normal, width);
            self.ensure_room(lines.len() as f32 * (lh + 1.0) + 4.0);

            let margin = self.margin();
            self.canvas
                .fill_circle(margin + 2.0, self.cursor.y - 1.0, 1.0, MARKER_COLOR);
            for line in &lines {
                let y = self.cursor.y;
                self.canvas.text(line, margin + 6.0, y, style);
                self.cursor.advance(lh + 1.0);
            }
            self.cursor.advance(2.0);
        }
        self.cursor.advance(3.0);
    }

    /// `Q{n}.` labels with the wrapped question beside them.
    pub fn discussion_questions(&mut self, questions: &[String]) {
        let label_style = TextStyle::new(BODY_FONT_SIZE, FontWeight::Normal, QUESTION_LABEL_COLOR);
        let text_style = TextStyle::new(BODY_FONT_SIZE, FontWeight::Normal, BODY_COLOR);
        let width = self.content_width() - 12.0;

        for (index, question) in questions.iter().enumerate() {
            let lines = self.wrap(question, BODY_FONT_SIZE, FontWeight::Normal, width);
            let block = lines.len() as f32 * COMPACT_LINE_ADVANCE + 3.0;
            self.ensure_room(block.max(15.0));

            let margin = self.margin();
            let y = self.cursor.y;
            self.canvas
                .text(&format!("Q{}.", index + 1), margin, y, label_style);
            for line in &lines {
                let y = self.cursor.y;
                self.canvas.text(line, margin + 10.0, y, text_style);
                self.cursor.advance(COMPACT_LINE_ADVANCE);
            }
            self.cursor.advance(3.0);
        }
        self.cursor.advance(3.0);
    }

    /// Bold step titles with their instructions; 5mm between steps, none after the last.
    pub fn presentation_flow(&mut self, steps: &[PresentationStep]) {
        let title_style = TextStyle::new(BODY_FONT_SIZE, FontWeight::Bold, HEADING_COLOR);
        let body_style = TextStyle::new(BODY_FONT_SIZE, FontWeight::Normal, MUTED_COLOR);
        let width = self.content_width() - 10.0;

        for (index, step) in steps.iter().enumerate() {
            let body = step.body.trim();
            let lines = if body.is_empty() {
                Vec::new()
            } else {
                self.wrap(body, BODY_FONT_SIZE, FontWeight::Normal, width)
            };

            let mut height = lines.len() as f32 * COMPACT_LINE_ADVANCE;
            if !step.title.is_empty() {
                height += 6.0;
            }
            self.ensure_room(height + 5.0);

            let margin = self.margin();
            if !step.title.is_empty() {
                let y = self.cursor.y;
                self.canvas.text(&step.title, margin, y, title_style);
                self.cursor.advance(6.0);
            }
            for line in &lines {
                let y = self.cursor.y;
                self.canvas.text(line, margin, y, body_style);
                self.cursor.advance(COMPACT_LINE_ADVANCE);
            }

            if index + 1 < steps.len() {
                self.cursor.advance(5.0);
            }
        }
    }

    /// Horizontal rule, heading, then the docent's own notes.
    pub fn artwork_information(&mut self, text: &str) {
        self.cursor.advance(10.0);
        // Rule, gap and heading move to the next page together.
        self.ensure_room(30.0);

        let margin = self.margin();
        let y = self.cursor.y;
        self.canvas
            .line(margin, y, self.geometry.width - margin, y, RULE_COLOR);
        self.cursor.advance(10.0);

        let y = self.cursor.y;
        self.canvas.text(
            "Artwork Information",
            margin,
            y,
            TextStyle::new(16.0, FontWeight::Bold, HEADING_COLOR),
        );
        self.cursor.advance(8.0);

        self.body_text(text);
    }

    /// Footer line near the bottom edge of the current page. Does not move the cursor.
    pub fn footer(&mut self) {
        let margin = self.margin();
        let y = self.geometry.height - 10.0;
        self.canvas.text(
            FOOTER_TEXT,
            margin,
            y,
            TextStyle::new(9.0, FontWeight::Normal, MARKER_COLOR),
        );
    }

    pub fn finish(self) -> LayoutSummary {
        LayoutSummary {
            page_count: self.cursor.page + 1,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Whole document
// ────────────────────────────────────────────────────────────────────────────

fn non_empty_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn non_empty_list(value: &Option<Vec<String>>) -> Option<&[String]> {
    value.as_deref().filter(|items| !items.is_empty())
}

/// Lays out the full guide document.
///
/// `images` is `None` when image probing failed; the image block is then
/// skipped and the rest of the document still renders.
pub fn lay_out_document<C: Canvas>(
    canvas: &mut C,
    images: Option<&[ImageDimensions]>,
    free_text: Option<&str>,
    guide: Option<&GuideDocument>,
) -> LayoutSummary {
    let mut layout = DocumentLayout::new(canvas);

    layout.title();

    if let Some(images) = images {
        layout.image_row(images);
    }

    if let Some(guide) = guide {
        if let Some(text) = non_empty_str(&guide.overview) {
            layout.section_header(1, "Overview");
            layout.body_text(text);
        }
        if let Some(text) = non_empty_str(&guide.visual_analysis) {
            layout.section_header(2, "Visual Analysis");
            layout.body_text(text);
        }
        if let Some(items) = non_empty_list(&guide.talking_points) {
            layout.section_header(3, "Talking Points");
            layout.bullet_list(items);
        }
        if let Some(items) = non_empty_list(&guide.fun_facts) {
            layout.section_header(4, "Fun Facts");
            layout.bullet_list(items);
        }
        if let Some(text) = non_empty_str(&guide.historical_context) {
            layout.section_header(5, "Historical Context");
            layout.body_text(text);
        }
        if let Some(items) = non_empty_list(&guide.discussion_questions) {
            layout.section_header(6, "Discussion Questions");
            layout.discussion_questions(items);
        }
        if non_empty_str(&guide.presentation_flow).is_some() {
            layout.section_header(7, "Suggested Presentation Flow");
            layout.presentation_flow(&guide.presentation_steps());
        }
    }

    if let Some(text) = free_text.filter(|t| !t.trim().is_empty()) {
        layout.artwork_information(text);
    }

    layout.footer();
    layout.finish()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
