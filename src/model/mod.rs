//! Core data types shared between parsing, structure reading, layout
//! analysis and rendering.
//!
//! The model is deliberately small: glyphs as they come out of the content
//! stream, geometric text blocks produced by layout segmentation, and the
//! classified [`ConversionUnit`]s the Markdown sink accepts.

mod block;
mod glyph;
mod span;
mod unit;

pub use block::{Line, TextBlock, Word};
pub use glyph::{BBox, Glyph};
pub use span::ContentSpan;
pub use unit::ConversionUnit;
