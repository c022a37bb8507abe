//! Per-document index of marked-content spans.

use std::collections::HashMap;

use crate::model::{ContentSpan, Glyph};
use crate::parser::PageContent;

/// Maps `(page, mcid)` to its content span, with page glyph storage.
///
/// Built once by folding every page's scanned spans; read-only afterward.
/// Duplicate identifiers on one page resolve to the most recently scanned
/// span (overwrite, not merge). Spans without an identifier never reach
/// the index.
#[derive(Debug, Default)]
pub struct SpanIndex {
    pages: HashMap<u32, PageSpans>,
}

#[derive(Debug, Default)]
struct PageSpans {
    glyphs: Vec<Glyph>,
    spans: HashMap<i64, ContentSpan>,
}

impl SpanIndex {
    /// Fold extracted page content into the index.
    pub fn build(pages: Vec<PageContent>) -> Self {
        let mut index = SpanIndex::default();
        for page in pages {
            let mut entry = PageSpans {
                glyphs: page.glyphs,
                spans: HashMap::with_capacity(page.spans.len()),
            };
            for span in page.spans {
                // Scan order; a repeated identifier overwrites.
                entry.spans.insert(span.mcid, span);
            }
            index.pages.insert(page.number, entry);
        }
        index
    }

    /// Look up a span; `None` for unindexed `(page, mcid)` pairs, which
    /// callers treat as empty text.
    pub fn get(&self, page: u32, mcid: i64) -> Option<&ContentSpan> {
        self.pages.get(&page)?.spans.get(&mcid)
    }

    /// Resolve a span's member glyphs against its page glyph list.
    pub fn span_glyphs(&self, page: u32, mcid: i64) -> Vec<&Glyph> {
        let Some(entry) = self.pages.get(&page) else {
            return Vec::new();
        };
        let Some(span) = entry.spans.get(&mcid) else {
            return Vec::new();
        };
        span.glyphs
            .iter()
            .filter_map(|&i| entry.glyphs.get(i as usize))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn glyph(value: &str, seq: u32) -> Glyph {
        Glyph {
            value: value.into(),
            bbox: BBox::new(seq as f32 * 6.0, 0.0, seq as f32 * 6.0 + 6.0, 12.0),
            size: 12.0,
            font: "Helvetica".into(),
            seq,
        }
    }

    fn span(mcid: i64, glyphs: Vec<u32>) -> ContentSpan {
        ContentSpan {
            mcid,
            artifact: false,
            actual_text: None,
            glyphs,
        }
    }

    #[test]
    fn test_lookup_and_missing() {
        let page = PageContent {
            number: 1,
            glyphs: vec![glyph("a", 0), glyph("b", 1)],
            spans: vec![span(0, vec![0, 1])],
        };
        let index = SpanIndex::build(vec![page]);
        assert!(index.get(1, 0).is_some());
        assert!(index.get(1, 7).is_none());
        assert!(index.get(2, 0).is_none());
        assert!(index.span_glyphs(2, 0).is_empty());
    }

    #[test]
    fn test_duplicate_mcid_last_wins() {
        let page = PageContent {
            number: 1,
            glyphs: vec![glyph("a", 0), glyph("b", 1)],
            spans: vec![span(3, vec![0]), span(3, vec![1])],
        };
        let index = SpanIndex::build(vec![page]);
        let resolved = index.span_glyphs(1, 3);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, "b");
    }

    #[test]
    fn test_same_mcid_on_different_pages() {
        let p1 = PageContent {
            number: 1,
            glyphs: vec![glyph("x", 0)],
            spans: vec![span(0, vec![0])],
        };
        let p2 = PageContent {
            number: 2,
            glyphs: vec![glyph("y", 0)],
            spans: vec![span(0, vec![0])],
        };
        let index = SpanIndex::build(vec![p1, p2]);
        assert_eq!(index.span_glyphs(1, 0)[0].value, "x");
        assert_eq!(index.span_glyphs(2, 0)[0].value, "y");
    }
}
