//! # papermark
//!
//! PDF to Markdown conversion that reconstructs logical reading order.
//!
//! Two independent sources of evidence drive the conversion: the
//! document's embedded logical-structure tree (Tagged PDF) when one
//! exists, and positional/typographic heuristics over raw glyph placement
//! when it does not. Structure tags map to headings, paragraphs, lists,
//! tables and figure placeholders; untagged documents are segmented into
//! blocks and classified by font-size ratios, boldness and leading list
//! markers.
//!
//! ## Example
//!
//! ```no_run
//! use papermark::to_markdown;
//!
//! let markdown = to_markdown("report.pdf")?;
//! println!("{}", markdown);
//! # Ok::<(), papermark::Error>(())
//! ```

pub mod convert;
pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;
pub mod structure;

use std::path::Path;

pub use convert::Converter;
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use model::ConversionUnit;
pub use parser::{ErrorMode, ParseOptions};
pub use render::MarkdownSink;
pub use structure::StructureDump;

/// Convert a PDF file to Markdown with default options.
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    to_markdown_with_options(path, ParseOptions::default())
}

/// Convert a PDF file to Markdown.
///
/// The file's format is validated before any conversion work starts;
/// non-PDF input fails with [`Error::UnknownFormat`].
pub fn to_markdown_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<String> {
    let path = path.as_ref();
    detect::detect_format_from_path(path)?;
    let doc = lopdf::Document::load(path)?;
    convert_document(&doc, options)
}

/// Convert in-memory PDF bytes to Markdown.
pub fn convert_bytes(data: &[u8], options: ParseOptions) -> Result<String> {
    detect::detect_format_from_bytes(data)?;
    let doc = lopdf::Document::load_mem(data)?;
    convert_document(&doc, options)
}

/// Convert an already-loaded document to Markdown.
pub fn convert_document(doc: &lopdf::Document, options: ParseOptions) -> Result<String> {
    if doc.is_encrypted() {
        return Err(Error::Encrypted);
    }
    Converter::new(options).convert(doc)
}

/// Diagnostic dump of a file's structure tree.
///
/// Returns `Ok(None)` for documents without one. Purely a reporting path;
/// running it has no effect on conversion output.
pub fn inspect_structure<P: AsRef<Path>>(path: P) -> Result<Option<StructureDump>> {
    let path = path.as_ref();
    detect::detect_format_from_path(path)?;
    let doc = lopdf::Document::load(path)?;
    if doc.is_encrypted() {
        return Err(Error::Encrypted);
    }
    let tree = structure::read_structure_tree(&doc)?;
    Ok(tree.map(|root| StructureDump::from_tree(&root)))
}
