//! Typographic block classification for untagged documents.
//!
//! The pipeline is two-phase: one document-wide median point size is
//! computed before any page is classified, then each block is judged
//! independently against that baseline.

use regex::Regex;

use crate::model::{ConversionUnit, Glyph, TextBlock};
use crate::structure::geometric_text;

/// Heading thresholds as ratios of predominant block size to the
/// document median.
const H1_RATIO: f32 = 1.8;
const H2_RATIO: f32 = 1.4;
const H3_RATIO: f32 = 1.15;

/// Blocks at or over this many characters are never headings.
const HEADING_MAX_CHARS: usize = 200;

/// Median point size across all sized glyphs of a document.
///
/// Even counts average the two middle values; a document with no sized
/// glyphs falls back to 12.0.
pub fn document_median_size<'a, I>(glyphs: I) -> f32
where
    I: IntoIterator<Item = &'a Glyph>,
{
    let mut sizes: Vec<f32> = glyphs
        .into_iter()
        .map(|g| g.size)
        .filter(|s| *s > 0.0)
        .collect();
    if sizes.is_empty() {
        return 12.0;
    }
    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sizes.len() / 2;
    if sizes.len() % 2 == 0 {
        (sizes[mid - 1] + sizes[mid]) / 2.0
    } else {
        sizes[mid]
    }
}

/// Compiled leading-marker patterns for list detection.
pub struct ListPatterns {
    bullet: Regex,
    numbered: Regex,
    number_label: Regex,
}

impl ListPatterns {
    pub fn new() -> Self {
        Self {
            bullet: Regex::new(r"^\s*[•◦▪‣·∙■□▸►◆*\-–—]\s+").unwrap(),
            numbered: Regex::new(r"^\s*\(?\d{1,3}[.)]\s+").unwrap(),
            number_label: Regex::new(r"^\(?\d{1,3}[.)]?$").unwrap(),
        }
    }

    /// Text after a leading bullet marker, if one is present.
    pub fn strip_bullet(&self, line: &str) -> Option<String> {
        self.bullet
            .find(line)
            .map(|m| line[m.end()..].trim().to_string())
    }

    /// Text after a leading number-plus-separator marker, if present.
    pub fn strip_number(&self, line: &str) -> Option<String> {
        self.numbered
            .find(line)
            .map(|m| line[m.end()..].trim().to_string())
    }

    /// Whether a bare label (no trailing text required) is a number
    /// marker, as found in list-item label elements.
    pub fn is_number_label(&self, label: &str) -> bool {
        self.number_label.is_match(label.trim())
    }
}

impl Default for ListPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify one block into conversion units.
///
/// Tried in order: heading by size ratio and boldness, then list by
/// leading-marker patterns, then paragraph with internal line breaks
/// flattened. Empty blocks yield nothing.
pub fn classify_block(
    block: &TextBlock,
    page_glyphs: &[Glyph],
    median: f32,
    patterns: &ListPatterns,
) -> Vec<ConversionUnit> {
    if block.is_empty() {
        return Vec::new();
    }
    let glyphs = block.glyphs(page_glyphs);
    // Heading and paragraph text comes from the glyphs in geometric
    // order; the line/word structure is consulted for list detection,
    // which is per-line.
    let text = if glyphs.is_empty() {
        block.text()
    } else {
        geometric_text(&glyphs)
    };

    if let Some(level) = heading_level(&text, &glyphs, block.lines.len(), median) {
        return vec![ConversionUnit::Heading(level, text)];
    }
    if let Some(units) = classify_list(block, patterns) {
        return units;
    }
    vec![ConversionUnit::Paragraph(text)]
}

fn heading_level(text: &str, glyphs: &[&Glyph], line_count: usize, median: f32) -> Option<u8> {
    if glyphs.is_empty() || median <= 0.0 || text.chars().count() >= HEADING_MAX_CHARS {
        return None;
    }
    let ratio = predominant_size(glyphs) / median;
    let bold = predominantly_bold(glyphs);
    if ratio >= H1_RATIO {
        Some(1)
    } else if ratio >= H2_RATIO {
        Some(2)
    } else if ratio >= H3_RATIO && bold {
        Some(3)
    } else if bold && line_count <= 2 {
        Some(4)
    } else {
        None
    }
}

/// The most frequent point size among the glyphs, rounded to one decimal.
/// Ties keep the first-encountered size.
fn predominant_size(glyphs: &[&Glyph]) -> f32 {
    let mut counts: Vec<(i64, usize)> = Vec::new();
    for glyph in glyphs {
        let key = (glyph.size * 10.0).round() as i64;
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    let mut best = counts[0];
    for &entry in &counts[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    best.0 as f32 / 10.0
}

/// More than half the glyphs carry a bold/heavy/black font marker.
fn predominantly_bold(glyphs: &[&Glyph]) -> bool {
    let bold = glyphs.iter().filter(|g| g.is_bold()).count();
    bold * 2 > glyphs.len()
}

/// List detection over a block's lines.
///
/// A single-line block is a list item when its text carries a leading
/// marker. A multi-line block is a list when at least half its lines
/// match one pattern; bullet and numbered majorities are checked
/// independently, bullet taking priority when both hold. Unmatched lines
/// continue the preceding item; lines before the first marker become a
/// leading paragraph. Numbered items are renumbered from 1 regardless of
/// the source numerals.
fn classify_list(block: &TextBlock, patterns: &ListPatterns) -> Option<Vec<ConversionUnit>> {
    let lines: Vec<String> = block.lines.iter().map(|l| l.text()).collect();

    if lines.len() == 1 {
        if let Some(rest) = patterns.strip_bullet(&lines[0]) {
            return Some(vec![ConversionUnit::BulletItem(rest)]);
        }
        if let Some(rest) = patterns.strip_number(&lines[0]) {
            return Some(vec![ConversionUnit::NumberedItem(1, rest)]);
        }
        return None;
    }

    let bullet_hits = lines
        .iter()
        .filter(|l| patterns.strip_bullet(l).is_some())
        .count();
    let number_hits = lines
        .iter()
        .filter(|l| patterns.strip_number(l).is_some())
        .count();

    let as_bullets = bullet_hits * 2 >= lines.len();
    let as_numbers = number_hits * 2 >= lines.len();
    if !as_bullets && !as_numbers {
        return None;
    }

    let strip = |line: &str| -> Option<String> {
        if as_bullets {
            patterns.strip_bullet(line)
        } else {
            patterns.strip_number(line)
        }
    };

    let mut units = Vec::new();
    let mut preamble: Vec<String> = Vec::new();
    let mut items: Vec<String> = Vec::new();
    for line in &lines {
        match strip(line) {
            Some(rest) => items.push(rest),
            None => match items.last_mut() {
                Some(item) => {
                    item.push(' ');
                    item.push_str(line.trim());
                }
                None => preamble.push(line.trim().to_string()),
            },
        }
    }
    if !preamble.is_empty() {
        units.push(ConversionUnit::Paragraph(preamble.join(" ")));
    }
    for (i, item) in items.into_iter().enumerate() {
        if as_bullets {
            units.push(ConversionUnit::BulletItem(item));
        } else {
            units.push(ConversionUnit::NumberedItem(i as u32 + 1, item));
        }
    }
    Some(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Line, Word};

    /// Build a block plus backing glyphs from (text, size, bold) lines.
    fn block_of(lines: &[(&str, f32, bool)]) -> (TextBlock, Vec<Glyph>) {
        let mut glyphs = Vec::new();
        let mut out_lines = Vec::new();
        for (li, (text, size, bold)) in lines.iter().enumerate() {
            let y = 700.0 - li as f32 * 20.0;
            let mut x = 0.0;
            let mut words = Vec::new();
            for word_text in text.split(' ') {
                let x_start = x;
                let mut ids = Vec::new();
                for ch in word_text.chars() {
                    let seq = glyphs.len() as u32;
                    glyphs.push(Glyph {
                        value: ch.to_string(),
                        bbox: BBox::new(x, y, x + 6.0, y + size),
                        size: *size,
                        font: if *bold { "Helvetica-Bold" } else { "Helvetica" }.into(),
                        seq,
                    });
                    ids.push(seq);
                    x += 6.0;
                }
                words.push(Word {
                    text: word_text.to_string(),
                    bbox: BBox::new(x_start, y, x, y + size),
                    min_seq: ids.first().copied().unwrap_or(0),
                    glyphs: ids,
                });
                x += 6.0;
            }
            out_lines.push(Line { words, y });
        }
        let block = TextBlock {
            lines: out_lines,
            rank: 0,
            bbox: BBox::new(0.0, 0.0, 100.0, 700.0),
        };
        (block, glyphs)
    }

    fn classify(lines: &[(&str, f32, bool)], median: f32) -> Vec<ConversionUnit> {
        let (block, glyphs) = block_of(lines);
        classify_block(&block, &glyphs, median, &ListPatterns::new())
    }

    #[test]
    fn test_median_odd_even_and_default() {
        let sizes = |v: &[f32]| -> Vec<Glyph> {
            v.iter()
                .map(|&s| Glyph {
                    value: "a".into(),
                    bbox: BBox::default(),
                    size: s,
                    font: "F".into(),
                    seq: 0,
                })
                .collect()
        };
        assert_eq!(document_median_size(&sizes(&[10.0, 12.0, 14.0])), 12.0);
        assert_eq!(document_median_size(&sizes(&[10.0, 12.0])), 11.0);
        assert_eq!(document_median_size(&sizes(&[])), 12.0);
        assert_eq!(document_median_size(&sizes(&[0.0])), 12.0);
    }

    #[test]
    fn test_heading_ratios() {
        let h1 = classify(&[("Big Title", 21.6, false)], 12.0);
        assert_eq!(h1, vec![ConversionUnit::Heading(1, "Big Title".into())]);

        let h2 = classify(&[("Section", 17.0, false)], 12.0);
        assert_eq!(h2, vec![ConversionUnit::Heading(2, "Section".into())]);

        let h3 = classify(&[("Subsection", 14.0, true)], 12.0);
        assert_eq!(h3, vec![ConversionUnit::Heading(3, "Subsection".into())]);

        // Same size without boldness is not a heading.
        let not_h3 = classify(&[("Subsection", 14.0, false)], 12.0);
        assert_eq!(
            not_h3,
            vec![ConversionUnit::Paragraph("Subsection".into())]
        );
    }

    #[test]
    fn test_bold_body_size_is_h4() {
        let h4 = classify(&[("Bold lead-in", 12.0, true)], 12.0);
        assert_eq!(h4, vec![ConversionUnit::Heading(4, "Bold lead-in".into())]);

        // Three bold lines no longer qualify.
        let long = classify(
            &[("one", 12.0, true), ("two", 12.0, true), ("three", 12.0, true)],
            12.0,
        );
        assert_eq!(
            long,
            vec![ConversionUnit::Paragraph("one two three".into())]
        );
    }

    #[test]
    fn test_heading_length_boundary_is_exclusive() {
        let at_199: String = "a".repeat(199);
        let at_200: String = "a".repeat(200);
        let h1 = classify(&[(at_199.as_str(), 21.6, false)], 12.0);
        assert!(matches!(h1[0], ConversionUnit::Heading(1, _)));
        let not_heading = classify(&[(at_200.as_str(), 21.6, false)], 12.0);
        assert!(matches!(not_heading[0], ConversionUnit::Paragraph(_)));
    }

    #[test]
    fn test_predominant_size_mode_with_tie() {
        let (_, glyphs) = block_of(&[("ab", 12.0, false)]);
        let refs: Vec<&Glyph> = glyphs.iter().collect();
        assert_eq!(predominant_size(&refs), 12.0);

        // 2 glyphs at 20pt vs 2 at 10pt: tie keeps first-encountered.
        let mut mixed = Vec::new();
        for (i, size) in [20.0, 20.0, 10.0, 10.0].iter().enumerate() {
            mixed.push(Glyph {
                value: "x".into(),
                bbox: BBox::default(),
                size: *size,
                font: "F".into(),
                seq: i as u32,
            });
        }
        let refs: Vec<&Glyph> = mixed.iter().collect();
        assert_eq!(predominant_size(&refs), 20.0);
    }

    #[test]
    fn test_bullet_list_items() {
        let units = classify(
            &[("• first item", 12.0, false), ("• second item", 12.0, false)],
            12.0,
        );
        assert_eq!(
            units,
            vec![
                ConversionUnit::BulletItem("first item".into()),
                ConversionUnit::BulletItem("second item".into()),
            ]
        );
    }

    #[test]
    fn test_numbered_list_renumbered_from_one() {
        let units = classify(
            &[("3. apples", 12.0, false), ("7. oranges", 12.0, false)],
            12.0,
        );
        assert_eq!(
            units,
            vec![
                ConversionUnit::NumberedItem(1, "apples".into()),
                ConversionUnit::NumberedItem(2, "oranges".into()),
            ]
        );
    }

    #[test]
    fn test_bullet_priority_over_numbered() {
        // Both majorities hold on these mixed lines; bullets win.
        let units = classify(
            &[
                ("• one", 12.0, false),
                ("• two", 12.0, false),
                ("1. three", 12.0, false),
                ("2. four", 12.0, false),
            ],
            12.0,
        );
        assert!(units.iter().all(|u| matches!(
            u,
            ConversionUnit::BulletItem(_) | ConversionUnit::Paragraph(_)
        )));
    }

    #[test]
    fn test_continuation_line_joins_previous_item() {
        let units = classify(
            &[
                ("• a very long item", 12.0, false),
                ("that wraps", 12.0, false),
                ("• second", 12.0, false),
                ("• third", 12.0, false),
            ],
            12.0,
        );
        assert_eq!(
            units[0],
            ConversionUnit::BulletItem("a very long item that wraps".into())
        );
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn test_plain_paragraph_flattens_lines() {
        let units = classify(
            &[("first line of", 12.0, false), ("the paragraph", 12.0, false)],
            12.0,
        );
        assert_eq!(
            units,
            vec![ConversionUnit::Paragraph(
                "first line of the paragraph".into()
            )]
        );
    }

    #[test]
    fn test_paragraph_text_follows_glyph_geometry() {
        // Words stored right-to-left in the line; the paragraph text must
        // come out in left-to-right position order regardless.
        let mut glyphs = Vec::new();
        let mut word = |text: &str, x0: f32| -> Word {
            let mut x = x0;
            let mut ids = Vec::new();
            for ch in text.chars() {
                let seq = glyphs.len() as u32;
                glyphs.push(Glyph {
                    value: ch.to_string(),
                    bbox: BBox::new(x, 700.0, x + 6.0, 712.0),
                    size: 12.0,
                    font: "Helvetica".into(),
                    seq,
                });
                ids.push(seq);
                x += 6.0;
            }
            Word {
                text: text.to_string(),
                bbox: BBox::new(x0, 700.0, x, 712.0),
                min_seq: ids[0],
                glyphs: ids,
            }
        };
        let right = word("world", 40.0);
        let left = word("hello", 0.0);
        let block = TextBlock {
            lines: vec![Line {
                words: vec![right, left],
                y: 700.0,
            }],
            rank: 0,
            bbox: BBox::new(0.0, 700.0, 70.0, 712.0),
        };
        let units = classify_block(&block, &glyphs, 12.0, &ListPatterns::new());
        assert_eq!(units, vec![ConversionUnit::Paragraph("hello world".into())]);
    }

    #[test]
    fn test_number_label_detection() {
        let patterns = ListPatterns::new();
        assert!(patterns.is_number_label("1."));
        assert!(patterns.is_number_label("12)"));
        assert!(patterns.is_number_label("(3)"));
        assert!(!patterns.is_number_label("•"));
        assert!(!patterns.is_number_label("a."));
    }
}
