//! Text reconstruction from structure nodes and raw glyph sets.
//!
//! Two ordering policies, chosen by call site. The structure-tree path
//! uses *stream order*: producing tools emit spans in reading order, so
//! the original emission index is the most reliable signal, and geometric
//! sorting would scramble multi-column content. The geometry-only
//! fallback uses *geometric order*: top to bottom, left to right, with
//! spacing inferred from gaps.

use crate::layout::segment_words;
use crate::model::Glyph;

use super::spans::SpanIndex;
use super::tree::{NodeChild, StructureNode};

/// Vertical gap fraction (of the previous glyph's height) that counts as
/// a line break in geometric ordering.
const LINE_GAP_RATIO: f32 = 0.5;

/// Horizontal gap fraction (of the previous glyph's width) that counts as
/// a word break in geometric ordering.
const WORD_GAP_RATIO: f32 = 0.3;

/// Reconstruct the full text of a structure node.
///
/// A node-level text override is returned verbatim. Otherwise every glyph
/// transitively reachable from the node is collected in document order —
/// direct span references resolved through the index, child nodes
/// recursively — and rendered in stream order. Artifact spans are
/// excluded at every depth; missing span lookups contribute empty text.
pub fn node_text(node: &StructureNode, index: &SpanIndex) -> String {
    if let Some(text) = &node.actual_text {
        return text.clone();
    }
    let mut parts: Vec<String> = Vec::new();
    let mut pending: Vec<&Glyph> = Vec::new();
    collect(node, index, &mut parts, &mut pending);
    flush(&mut parts, &mut pending);
    collapse_whitespace(&parts.join(" "))
}

fn collect<'a>(
    node: &StructureNode,
    index: &'a SpanIndex,
    parts: &mut Vec<String>,
    pending: &mut Vec<&'a Glyph>,
) {
    for child in &node.children {
        match child {
            NodeChild::Span { page, mcid } => match index.get(*page, *mcid) {
                // Unindexed lookup: empty text, never fatal.
                None => {}
                Some(span) if span.artifact => {}
                Some(span) => {
                    if let Some(text) = &span.actual_text {
                        flush(parts, pending);
                        parts.push(text.clone());
                    } else {
                        pending.extend(index.span_glyphs(*page, *mcid));
                    }
                }
            },
            NodeChild::Node(inner) => {
                if let Some(text) = &inner.actual_text {
                    flush(parts, pending);
                    parts.push(text.clone());
                } else {
                    collect(inner, index, parts, pending);
                }
            }
        }
    }
}

fn flush(parts: &mut Vec<String>, pending: &mut Vec<&Glyph>) {
    if pending.is_empty() {
        return;
    }
    let text = stream_text(pending);
    if !text.is_empty() {
        parts.push(text);
    }
    pending.clear();
}

/// Render glyphs in original stream order.
///
/// Words are grouped geometrically, then ordered by the minimum emission
/// index of any member glyph (a stable sort, so equal keys keep their
/// segmentation order) and joined with single spaces.
pub fn stream_text(glyphs: &[&Glyph]) -> String {
    let mut words = segment_words(glyphs);
    words.sort_by_key(|w| w.min_seq);
    let joined = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Render glyphs in geometric order: top to bottom, left to right.
///
/// A space is inserted at a line break (vertical gap over half the
/// previous glyph's height) or, failing that, at a word break (horizontal
/// gap over 30% of the previous glyph's width).
pub fn geometric_text(glyphs: &[&Glyph]) -> String {
    let mut sorted: Vec<&Glyph> = glyphs.to_vec();
    sorted.sort_by(|a, b| {
        b.bbox
            .y0
            .partial_cmp(&a.bbox.y0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let mut out = String::new();
    let mut prev: Option<&Glyph> = None;
    for glyph in sorted {
        if let Some(p) = prev {
            let vertical_gap = p.bbox.y0 - glyph.bbox.y0;
            if vertical_gap > p.height() * LINE_GAP_RATIO {
                out.push(' ');
            } else if glyph.bbox.x0 - p.bbox.x1 > p.width() * WORD_GAP_RATIO {
                out.push(' ');
            }
        }
        out.push_str(&glyph.value);
        prev = Some(glyph);
    }
    collapse_whitespace(&out)
}

/// Collapse whitespace runs to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
