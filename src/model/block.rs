//! Geometric text units produced by layout segmentation.

use super::glyph::{BBox, Glyph};

/// A word: a run of glyphs with no significant horizontal gap.
#[derive(Debug, Clone)]
pub struct Word {
    /// Concatenated glyph values.
    pub text: String,
    /// Aggregate bounding box.
    pub bbox: BBox,
    /// Smallest emission-order index of any member glyph.
    pub min_seq: u32,
    /// Indices of the member glyphs in the page glyph list.
    pub glyphs: Vec<u32>,
}

/// A line of words sharing a baseline.
#[derive(Debug, Clone)]
pub struct Line {
    /// Words ordered left to right.
    pub words: Vec<Word>,
    /// Baseline Y position.
    pub y: f32,
}

impl Line {
    /// Words joined with single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A geometrically segmented region of one page.
///
/// `rank` is a 0-based total order over the blocks of a page, assigned by
/// the reading-order detector; it is deterministic, so ties cannot occur.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// Lines in top-to-bottom order.
    pub lines: Vec<Line>,
    /// Reading-order rank within the page.
    pub rank: usize,
    /// Aggregate bounding box.
    pub bbox: BBox,
}

impl TextBlock {
    /// All lines joined with single spaces (internal breaks flattened).
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when the block contains no lines or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() || self.lines.iter().all(|l| l.text().trim().is_empty())
    }

    /// Indices of every member glyph, in line/word order.
    pub fn glyph_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines
            .iter()
            .flat_map(|l| l.words.iter())
            .flat_map(|w| w.glyphs.iter().copied())
    }

    /// Resolve the block's glyphs against the page glyph list.
    pub fn glyphs<'a>(&self, page_glyphs: &'a [Glyph]) -> Vec<&'a Glyph> {
        self.glyph_ids()
            .filter_map(|i| page_glyphs.get(i as usize))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Word {
        Word {
            text: text.into(),
            bbox: BBox::default(),
            min_seq: 0,
            glyphs: vec![],
        }
    }

    #[test]
    fn test_block_text_flattens_lines() {
        let block = TextBlock {
            lines: vec![
                Line {
                    words: vec![word("first"), word("line")],
                    y: 700.0,
                },
                Line {
                    words: vec![word("second")],
                    y: 686.0,
                },
            ],
            rank: 0,
            bbox: BBox::default(),
        };
        assert_eq!(block.text(), "first line second");
        assert!(!block.is_empty());
    }

    #[test]
    fn test_empty_block() {
        let block = TextBlock {
            lines: vec![],
            rank: 0,
            bbox: BBox::default(),
        };
        assert!(block.is_empty());
    }
}
