//! Marked-content spans scanned out of a page's content stream.

/// A contiguous marked span of glyphs on one page.
///
/// Identified by its MCID, unique within a page only. The glyph list is in
/// original content-stream emission order, which is the ground truth for
/// intra-span reading order.
#[derive(Debug, Clone)]
pub struct ContentSpan {
    /// Marked-content identifier (non-negative for indexed spans).
    pub mcid: i64,
    /// True when the span or an enclosing span is tagged as an artifact
    /// (decorative/background content, excluded from text reconstruction).
    pub artifact: bool,
    /// Direct text override from the span properties, returned verbatim
    /// instead of reconstructing from glyphs.
    pub actual_text: Option<String>,
    /// Indices of member glyphs in the page glyph list, emission order.
    pub glyphs: Vec<u32>,
}

impl ContentSpan {
    /// Create an empty span with the given identifier.
    pub fn new(mcid: i64) -> Self {
        Self {
            mcid,
            artifact: false,
            actual_text: None,
            glyphs: Vec::new(),
        }
    }
}
