//! Geometric segmentation: glyphs into words, words into lines, lines
//! into blocks, blocks into reading order.
//!
//! All grouping is deterministic, so reading-order ranks form a total
//! order with no ties.

use crate::model::{BBox, Glyph, Line, TextBlock, Word};

/// Horizontal gap, as a fraction of the previous glyph's width, that
/// separates two words on the same line.
const WORD_GAP_RATIO: f32 = 0.3;

/// Multiple of the average line spacing beyond which two lines belong to
/// different blocks.
const BLOCK_GAP_RATIO: f32 = 1.5;

/// Group an unordered glyph set into words.
///
/// Glyphs are binned into lines by baseline proximity, ordered left to
/// right within each line, and split at significant horizontal gaps. The
/// returned words carry their member glyphs' emission indices, so callers
/// can re-order them by original stream position.
pub fn segment_words(glyphs: &[&Glyph]) -> Vec<Word> {
    lines_of(glyphs)
        .into_iter()
        .flat_map(|line| line.words)
        .collect()
}

/// Group an unordered glyph set into baseline lines, top to bottom.
fn lines_of(glyphs: &[&Glyph]) -> Vec<Line> {
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

    let mut lines: Vec<Vec<&Glyph>> = Vec::new();
    for glyph in sorted {
        let tolerance = (glyph.height() * 0.5).max(2.0);
        match lines.last_mut() {
            Some(line) if (line[0].bbox.y0 - glyph.bbox.y0).abs() <= tolerance => {
                line.push(glyph);
            }
            _ => lines.push(vec![glyph]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| {
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let y = line[0].bbox.y0;
            Line {
                words: words_of_line(&line),
                y,
            }
        })
        .collect()
}

/// Split one x-ordered line of glyphs into words at horizontal gaps.
fn words_of_line(line: &[&Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Vec<&Glyph> = Vec::new();

    for &glyph in line {
        if let Some(prev) = current.last() {
            let gap = glyph.bbox.x0 - prev.bbox.x1;
            if gap > prev.width() * WORD_GAP_RATIO {
                words.push(make_word(&current));
                current.clear();
            }
        }
        current.push(glyph);
    }
    if !current.is_empty() {
        words.push(make_word(&current));
    }
    words
}

fn make_word(glyphs: &[&Glyph]) -> Word {
    let mut text = String::new();
    let mut bbox = glyphs[0].bbox;
    let mut min_seq = u32::MAX;
    let mut ids = Vec::with_capacity(glyphs.len());
    for glyph in glyphs {
        text.push_str(&glyph.value);
        bbox = bbox.union(&glyph.bbox);
        min_seq = min_seq.min(glyph.seq);
        ids.push(glyph.seq);
    }
    Word {
        text,
        bbox,
        min_seq,
        glyphs: ids,
    }
}

/// Segment a page's glyphs into ranked text blocks.
///
/// Lines whose baseline gap exceeds [`BLOCK_GAP_RATIO`] times the page's
/// average line spacing start a new block. Blocks are then ranked top to
/// bottom, left to right; ranks are 0-based within the page.
pub fn segment_page(glyphs: &[Glyph]) -> Vec<TextBlock> {
    let refs: Vec<&Glyph> = glyphs.iter().collect();
    let lines = lines_of(&refs);
    if lines.is_empty() {
        return Vec::new();
    }

    let gaps: Vec<f32> = lines.windows(2).map(|w| (w[0].y - w[1].y).abs()).collect();
    let avg_gap = if gaps.is_empty() {
        0.0
    } else {
        gaps.iter().sum::<f32>() / gaps.len() as f32
    };

    let mut groups: Vec<Vec<Line>> = Vec::new();
    for (i, line) in lines.into_iter().enumerate() {
        let breaks = i == 0 || (avg_gap > 0.0 && gaps[i - 1] > avg_gap * BLOCK_GAP_RATIO);
        if breaks {
            groups.push(Vec::new());
        }
        groups.last_mut().unwrap().push(line);
    }

    let mut blocks: Vec<TextBlock> = groups
        .into_iter()
        .map(|lines| {
            let bbox = lines
                .iter()
                .flat_map(|l| l.words.iter())
                .map(|w| w.bbox)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default();
            TextBlock {
                lines,
                rank: 0,
                bbox,
            }
        })
        .collect();

    blocks.sort_by(|a, b| {
        b.bbox
            .y1
            .partial_cmp(&a.bbox.y1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    for (rank, block) in blocks.iter_mut().enumerate() {
        block.rank = rank;
    }
    blocks
}
