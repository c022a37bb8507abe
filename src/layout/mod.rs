//! Layout analysis: geometric segmentation and typographic
//! classification for documents without a structure tree.

mod analyze;
mod segment;

pub use analyze::{classify_block, document_median_size, ListPatterns};
pub use segment::{segment_page, segment_words};
