// Document layout: font metrics, word wrap, image row sizing and pagination.
// Layout is synchronous and CPU-bound; callers run it inside tokio::task::spawn_blocking.

pub mod canvas;
pub mod cursor;
pub mod document;
pub mod font_metrics;
pub mod image_row;

pub use document::lay_out_document;
pub use image_row::ImageDimensions;
