//! Document-model access: reference resolution, page mapping, and
//! content-stream interpretation into glyphs and marked-content spans.

mod content;
mod options;
mod resolve;

pub use content::{extract_page, extract_pages, PageContent};
pub(crate) use content::decode_text_simple;
pub use options::{ErrorMode, ParseOptions};
pub use resolve::{page_index_map, resolve, MAX_REF_HOPS};
