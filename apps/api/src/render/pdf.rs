//! `Canvas` backed by printpdf.
//!
//! Layout coordinates are top-left origin with `y` growing downwards; PDF user
//! space is bottom-left with `y` growing upwards, so every `y` is flipped
//! against the page height here and nowhere else.

use image::{DynamicImage, GenericImageView};
use printpdf::utils::calculate_points_for_circle;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Polygon,
};
use printpdf::path::{PaintMode, WindingOrder};

use crate::layout::canvas::{Canvas, Rgb, TextStyle};
use crate::layout::cursor::PageGeometry;
use crate::layout::font_metrics::FontWeight;
use crate::render::ExportError;

const LAYER_NAME: &str = "Layer 1";
/// Resolution images are embedded at; their natural size follows from it.
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

pub struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    images: Vec<DynamicImage>,
    geometry: PageGeometry,
}

impl PdfCanvas {
    /// `images` are indexed by the layout's `Canvas::image` calls.
    pub fn new(title: &str, images: Vec<DynamicImage>) -> Result<Self, ExportError> {
        let geometry = PageGeometry::A4;
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(geometry.width),
            Mm(geometry.height),
            LAYER_NAME,
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            images,
            geometry,
        })
    }

    pub fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }

    fn flip(&self, y: f32) -> Mm {
        Mm(self.geometry.height - y)
    }

    fn font(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Normal => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

fn pdf_color(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

/// Code points outside Latin-1 that WinAnsiEncoding still carries (0x80..=0x9F).
const WIN_ANSI_EXTRAS: &[char] = &[
    '\u{20AC}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{017D}', '\u{2018}',
    '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}',
    '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{017E}', '\u{0178}',
];

/// Maps text onto the WinAnsiEncoding used for the built-in Helvetica faces.
///
/// Latin-1 and the typographic punctuation WinAnsi carries pass through.
/// A few near-misses (primes, minus sign) get an ASCII stand-in; anything
/// else becomes `?`.
pub fn to_builtin_charset(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => out.push(' '),
            ' '..='~' | '\u{00A0}'..='\u{00FF}' => out.push(c),
            c if WIN_ANSI_EXTRAS.contains(&c) => out.push(c),
            '\u{2032}' => out.push('\''),
            '\u{2033}' => out.push('"'),
            '\u{2010}' | '\u{2011}' | '\u{2212}' => out.push('-'),
            _ => out.push('?'),
        }
    }
    out
}

impl Canvas for PdfCanvas {
    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.geometry.width),
            Mm(self.geometry.height),
            LAYER_NAME,
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        let text = to_builtin_charset(text);
        self.layer.set_fill_color(pdf_color(style.color));
        self.layer.use_text(
            text,
            style.font_size,
            Mm(x),
            self.flip(y),
            self.font(style.weight),
        );
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        let points = calculate_points_for_circle(Mm(radius), Mm(cx), self.flip(cy));
        self.layer.set_fill_color(pdf_color(color));
        self.layer.add_polygon(Polygon {
            rings: vec![points],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let top = self.flip(y);
        let bottom = self.flip(y + height);
        let points = vec![
            (Point::new(Mm(x), bottom), false),
            (Point::new(Mm(x + width), bottom), false),
            (Point::new(Mm(x + width), top), false),
            (Point::new(Mm(x), top), false),
        ];
        self.layer.set_fill_color(pdf_color(color));
        self.layer.add_polygon(Polygon {
            rings: vec![points],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb) {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(0.75);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), self.flip(y1)), false),
                (Point::new(Mm(x2), self.flip(y2)), false),
            ],
            is_closed: false,
        });
    }

    fn image(&mut self, index: usize, x: f32, y: f32, width: f32, height: f32) {
        let Some(source) = self.images.get(index) else {
            tracing::warn!("No decoded image at index {index}; skipping");
            return;
        };
        if source.width() == 0 || source.height() == 0 {
            return;
        }

        let natural_width = source.width() as f32 / IMAGE_DPI * MM_PER_INCH;
        let natural_height = source.height() as f32 / IMAGE_DPI * MM_PER_INCH;
        // Alpha channels are flattened; the PDF image is always RGB.
        let rgb = DynamicImage::ImageRgb8(source.to_rgb8());

        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(self.flip(y + height)),
                scale_x: Some(width / natural_width),
                scale_y: Some(height / natural_height),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_charset_keeps_latin1_text() {
        let text = "Mus\u{00E9}e d'Orsay, Renoir, Dal\u{00ED}, Se\u{00F1}ora";
        assert_eq!(to_builtin_charset(text), text);
        assert_eq!(to_builtin_charset("plain ASCII ~"), "plain ASCII ~");
    }

    #[test]
    fn test_builtin_charset_keeps_win_ansi_punctuation() {
        let text = "\u{201C}Water Lilies\u{201D} \u{2014} Monet\u{2019}s \u{2022} and then\u{2026}";
        assert_eq!(to_builtin_charset(text), text);
        assert_eq!(to_builtin_charset("5\u{2032}\u{2212}2"), "5'-2");
    }

    #[test]
    fn test_builtin_charset_replaces_unrepresentable() {
        assert_eq!(to_builtin_charset("Caf\u{00E9} \u{6C34}"), "Caf\u{00E9} ?");
        assert_eq!(to_builtin_charset("\u{0391}\u{1F3A8}\tend"), "?? end");
    }

    #[test]
    fn test_pdf_canvas_writes_multi_page_document() {
        let mut canvas = PdfCanvas::new("Docent Presentation Guide", Vec::new()).unwrap();
        let style = TextStyle::new(11.0, FontWeight::Normal, Rgb(0, 0, 0));
        canvas.text("First page", 20.0, 20.0, style);
        canvas.fill_circle(24.0, 40.0, 4.0, Rgb(245, 245, 244));
        canvas.fill_rect(20.0, 50.0, 25.0, 6.0, Rgb(41, 37, 36));
        canvas.line(20.0, 60.0, 190.0, 60.0, Rgb(214, 211, 209));
        canvas.new_page();
        canvas.text("Mus\u{00E9}e d\u{2019}Orsay", 20.0, 20.0, style);

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_canvas_embeds_image() {
        let source = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            8,
            4,
            image::Rgb([200, 100, 50]),
        ));
        let mut canvas = PdfCanvas::new("Docent Presentation Guide", vec![source]).unwrap();
        canvas.image(0, 20.0, 40.0, 80.0, 40.0);
        // Out-of-range index is ignored.
        canvas.image(3, 20.0, 40.0, 80.0, 40.0);

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
