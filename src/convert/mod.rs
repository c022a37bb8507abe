//! Document conversion: strategy selection and unit emission.
//!
//! One conversion is strictly two-phase: all pages are indexed first,
//! then either the structure tree is walked (when a usable one exists) or
//! every page goes through layout analysis. Unit production per node is a
//! pure function returning an ordered sequence, merged by the caller, so
//! there is no shared accumulator threaded through the recursion.

use lopdf::Document as LopdfDocument;

use crate::error::Result;
use crate::layout::{classify_block, document_median_size, segment_page, ListPatterns};
use crate::model::ConversionUnit;
use crate::parser::{extract_pages, ParseOptions};
use crate::render::MarkdownSink;
use crate::structure::{
    node_text, read_structure_tree, NodeChild, SpanIndex, StructureNode, Tag,
};

/// Converts one document to Markdown.
pub struct Converter {
    options: ParseOptions,
    patterns: ListPatterns,
}

impl Converter {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            patterns: ListPatterns::new(),
        }
    }

    /// Convert a loaded document to a complete Markdown string.
    ///
    /// The structure-tree path is taken only when the tree exists and
    /// carries at least one element; otherwise layout analysis runs.
    /// Either a complete result is produced or the conversion fails as a
    /// whole; nothing is partially written.
    pub fn convert(&self, doc: &LopdfDocument) -> Result<String> {
        let pages = extract_pages(doc, &self.options)?;
        let tree = read_structure_tree(doc)?;

        let mut sink = MarkdownSink::new();
        match tree {
            Some(root) if root.has_elements() => {
                log::debug!("converting via structure tree");
                let index = SpanIndex::build(pages);
                for unit in self.units_of(&root, &index) {
                    sink.push(unit);
                }
            }
            _ => {
                log::debug!("no usable structure tree, converting via layout analysis");
                let median = document_median_size(pages.iter().flat_map(|p| p.glyphs.iter()));
                for page in &pages {
                    for block in segment_page(&page.glyphs) {
                        for unit in classify_block(&block, &page.glyphs, median, &self.patterns)
                        {
                            sink.push(unit);
                        }
                    }
                }
            }
        }
        Ok(sink.finish())
    }

    /// Ordered units for one node and its subtree.
    pub fn units_of(&self, node: &StructureNode, index: &SpanIndex) -> Vec<ConversionUnit> {
        match node.tag {
            Tag::Heading(level) => {
                let text = node_text(node, index);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ConversionUnit::Heading(level, text)]
                }
            }
            Tag::Paragraph | Tag::Caption | Tag::Label | Tag::ListBody | Tag::TableCell
            | Tag::TableHeaderCell => {
                let text = node_text(node, index);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ConversionUnit::Paragraph(text)]
                }
            }
            Tag::List => self.list_units(node, index),
            // A list item outside a list renders as a one-item list.
            Tag::ListItem => {
                let text = text_without_labels(node, index);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ConversionUnit::BulletItem(text)]
                }
            }
            Tag::Table => self.table_units(node, index),
            Tag::TableRow => {
                let cells = row_cells(node, index);
                if cells.is_empty() {
                    Vec::new()
                } else {
                    vec![ConversionUnit::TableRow(cells)]
                }
            }
            Tag::Figure => vec![ConversionUnit::FigurePlaceholder(figure_caption(
                node, index,
            ))],
            Tag::Container => self.container_units(node, index),
            Tag::Unknown => {
                // Unknown grouping tags recurse; unknown leaves render as
                // paragraphs so their text is not lost.
                if node.child_nodes().next().is_some() {
                    self.container_units(node, index)
                } else {
                    let text = node_text(node, index);
                    if text.is_empty() {
                        Vec::new()
                    } else {
                        vec![ConversionUnit::Paragraph(text)]
                    }
                }
            }
        }
    }

    fn container_units(&self, node: &StructureNode, index: &SpanIndex) -> Vec<ConversionUnit> {
        let mut units: Vec<ConversionUnit> = node
            .child_nodes()
            .flat_map(|child| self.units_of(child, index))
            .collect();
        // A container with no element children but direct content still
        // contributes its text.
        if units.is_empty() {
            let text = node_text(node, index);
            if !text.is_empty() {
                units.push(ConversionUnit::Paragraph(text));
            }
        }
        units
    }

    /// Units for a list element.
    ///
    /// The list style follows the first labeled item: a numeric label
    /// makes the whole list ordered, renumbered sequentially from 1
    /// regardless of the source numerals; anything else, including
    /// missing labels, renders as bullets.
    fn list_units(&self, node: &StructureNode, index: &SpanIndex) -> Vec<ConversionUnit> {
        let items: Vec<&StructureNode> = node
            .child_nodes()
            .filter(|n| n.tag == Tag::ListItem)
            .collect();

        let numbered = items
            .iter()
            .find_map(|item| item_label(item, index))
            .map(|label| self.patterns.is_number_label(&label))
            .unwrap_or(false);

        let mut units = Vec::new();
        // Non-item children (captions, nested lists hoisted to this
        // level) are processed in place.
        let mut next_number = 1u32;
        for child in node.child_nodes() {
            if child.tag != Tag::ListItem {
                units.extend(self.units_of(child, index));
                continue;
            }
            let text = text_without_labels(child, index);
            if text.is_empty() {
                continue;
            }
            if numbered {
                units.push(ConversionUnit::NumberedItem(next_number, text));
                next_number += 1;
            } else {
                units.push(ConversionUnit::BulletItem(text));
            }
        }
        units
    }

    fn table_units(&self, node: &StructureNode, index: &SpanIndex) -> Vec<ConversionUnit> {
        let mut units = Vec::new();
        self.collect_table_rows(node, index, &mut units);
        units
    }

    fn collect_table_rows(
        &self,
        node: &StructureNode,
        index: &SpanIndex,
        units: &mut Vec<ConversionUnit>,
    ) {
        for child in node.child_nodes() {
            match child.tag {
                Tag::TableRow => {
                    let cells = row_cells(child, index);
                    if cells.is_empty() {
                        continue;
                    }
                    let is_header = child
                        .child_nodes()
                        .any(|cell| cell.tag == Tag::TableHeaderCell);
                    if is_header {
                        units.push(ConversionUnit::TableHeader(cells));
                    } else {
                        units.push(ConversionUnit::TableRow(cells));
                    }
                }
                // THead/TBody/TFoot group rows without adding structure.
                Tag::Container => self.collect_table_rows(child, index, units),
                _ => units.extend(self.units_of(child, index)),
            }
        }
    }
}

/// Cell texts of a table row, in document order.
fn row_cells(row: &StructureNode, index: &SpanIndex) -> Vec<String> {
    row.child_nodes()
        .filter(|n| matches!(n.tag, Tag::TableCell | Tag::TableHeaderCell))
        .map(|cell| node_text(cell, index))
        .collect()
}

/// Text of a list item's label element, if it has one.
fn item_label(item: &StructureNode, index: &SpanIndex) -> Option<String> {
    item.child_nodes()
        .find(|n| n.tag == Tag::Label)
        .map(|label| node_text(label, index))
        .filter(|text| !text.is_empty())
}

/// A list item's text with its marker labels excluded, at every depth
/// directly below the item.
fn text_without_labels(item: &StructureNode, index: &SpanIndex) -> String {
    let parts: Vec<String> = item
        .children
        .iter()
        .filter_map(|child| match child {
            NodeChild::Node(n) if n.tag == Tag::Label => None,
            NodeChild::Node(n) => Some(node_text(n, index)),
            NodeChild::Span { page, mcid } => {
                let shim = StructureNode {
                    tag: Tag::Paragraph,
                    raw_tag: String::new(),
                    page: 0,
                    actual_text: None,
                    children: vec![NodeChild::Span {
                        page: *page,
                        mcid: *mcid,
                    }],
                };
                Some(node_text(&shim, index))
            }
        })
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}

/// Caption text for a figure: an explicit caption child first, then the
/// element's text override, then whatever glyphs the figure owns.
fn figure_caption(node: &StructureNode, index: &SpanIndex) -> String {
    if let Some(caption) = node.child_nodes().find(|n| n.tag == Tag::Caption) {
        let text = node_text(caption, index);
        if !text.is_empty() {
            return text;
        }
    }
    if let Some(text) = &node.actual_text {
        return text.clone();
    }
    node_text(node, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, ContentSpan, Glyph};
    use crate::parser::PageContent;

    fn glyphs_for(text: &str, y: f32, seq0: u32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| Glyph {
                value: c.to_string(),
                bbox: BBox::new(i as f32 * 6.0, y, i as f32 * 6.0 + 6.0, y + 12.0),
                size: 12.0,
                font: "Helvetica".into(),
                seq: seq0 + i as u32,
            })
            .collect()
    }

    /// Index with one span per entry, each holding one word of glyphs.
    fn index_of(words: &[&str]) -> SpanIndex {
        let mut glyphs = Vec::new();
        let mut spans = Vec::new();
        for (i, word) in words.iter().enumerate() {
            let seq0 = glyphs.len() as u32;
            let word_glyphs = glyphs_for(word, 700.0 - i as f32 * 20.0, seq0);
            spans.push(ContentSpan {
                mcid: i as i64,
                artifact: false,
                actual_text: None,
                glyphs: word_glyphs.iter().map(|g| g.seq).collect(),
            });
            glyphs.extend(word_glyphs);
        }
        SpanIndex::build(vec![PageContent {
            number: 1,
            glyphs,
            spans,
        }])
    }

    fn elem(tag: Tag, raw: &str, children: Vec<NodeChild>) -> StructureNode {
        StructureNode {
            tag,
            raw_tag: raw.into(),
            page: 1,
            actual_text: None,
            children,
        }
    }

    fn span(mcid: i64) -> NodeChild {
        NodeChild::Span { page: 1, mcid }
    }

    fn converter() -> Converter {
        Converter::new(ParseOptions::default())
    }

    #[test]
    fn test_heading_unit() {
        let index = index_of(&["Title"]);
        let node = elem(Tag::Heading(1), "H1", vec![span(0)]);
        assert_eq!(
            converter().units_of(&node, &index),
            vec![ConversionUnit::Heading(1, "Title".into())]
        );
    }

    #[test]
    fn test_empty_node_contributes_nothing() {
        let index = index_of(&[]);
        let node = elem(Tag::Paragraph, "P", vec![]);
        assert!(converter().units_of(&node, &index).is_empty());
        // A dangling span reference degrades to no units as well.
        let node = elem(Tag::Paragraph, "P", vec![span(9)]);
        assert!(converter().units_of(&node, &index).is_empty());
    }

    #[test]
    fn test_numbered_list_from_first_label() {
        let index = index_of(&["1.", "apples", "2.", "oranges"]);
        let li = |label, body| {
            elem(
                Tag::ListItem,
                "LI",
                vec![
                    NodeChild::Node(elem(Tag::Label, "Lbl", vec![span(label)])),
                    NodeChild::Node(elem(Tag::ListBody, "LBody", vec![span(body)])),
                ],
            )
        };
        let list = elem(
            Tag::List,
            "L",
            vec![NodeChild::Node(li(0, 1)), NodeChild::Node(li(2, 3))],
        );
        assert_eq!(
            converter().units_of(&list, &index),
            vec![
                ConversionUnit::NumberedItem(1, "apples".into()),
                ConversionUnit::NumberedItem(2, "oranges".into()),
            ]
        );
    }

    #[test]
    fn test_bullet_list_from_bullet_label() {
        let index = index_of(&["•", "first", "•", "second"]);
        let li = |label, body| {
            elem(
                Tag::ListItem,
                "LI",
                vec![
                    NodeChild::Node(elem(Tag::Label, "Lbl", vec![span(label)])),
                    NodeChild::Node(elem(Tag::ListBody, "LBody", vec![span(body)])),
                ],
            )
        };
        let list = elem(
            Tag::List,
            "L",
            vec![NodeChild::Node(li(0, 1)), NodeChild::Node(li(2, 3))],
        );
        assert_eq!(
            converter().units_of(&list, &index),
            vec![
                ConversionUnit::BulletItem("first".into()),
                ConversionUnit::BulletItem("second".into()),
            ]
        );
    }

    #[test]
    fn test_unlabeled_items_default_to_bullets() {
        let index = index_of(&["only"]);
        let li = elem(
            Tag::ListItem,
            "LI",
            vec![NodeChild::Node(elem(Tag::ListBody, "LBody", vec![span(0)]))],
        );
        let list = elem(Tag::List, "L", vec![NodeChild::Node(li)]);
        assert_eq!(
            converter().units_of(&list, &index),
            vec![ConversionUnit::BulletItem("only".into())]
        );
    }

    #[test]
    fn test_table_rows_and_header() {
        let index = index_of(&["h1", "h2", "a", "b"]);
        let cell = |tag, raw, mcid| NodeChild::Node(elem(tag, raw, vec![span(mcid)]));
        let header_row = elem(
            Tag::TableRow,
            "TR",
            vec![
                cell(Tag::TableHeaderCell, "TH", 0),
                cell(Tag::TableHeaderCell, "TH", 1),
            ],
        );
        let body_row = elem(
            Tag::TableRow,
            "TR",
            vec![cell(Tag::TableCell, "TD", 2), cell(Tag::TableCell, "TD", 3)],
        );
        let table = elem(
            Tag::Table,
            "Table",
            vec![NodeChild::Node(header_row), NodeChild::Node(body_row)],
        );
        assert_eq!(
            converter().units_of(&table, &index),
            vec![
                ConversionUnit::TableHeader(vec!["h1".into(), "h2".into()]),
                ConversionUnit::TableRow(vec!["a".into(), "b".into()]),
            ]
        );
    }

    #[test]
    fn test_figure_uses_caption_child() {
        let index = index_of(&["Diagram"]);
        let figure = elem(
            Tag::Figure,
            "Figure",
            vec![NodeChild::Node(elem(Tag::Caption, "Caption", vec![span(0)]))],
        );
        assert_eq!(
            converter().units_of(&figure, &index),
            vec![ConversionUnit::FigurePlaceholder("Diagram".into())]
        );
    }

    #[test]
    fn test_container_merges_children_in_order() {
        let index = index_of(&["Title", "body"]);
        let sect = elem(
            Tag::Container,
            "Sect",
            vec![
                NodeChild::Node(elem(Tag::Heading(2), "H2", vec![span(0)])),
                NodeChild::Node(elem(Tag::Paragraph, "P", vec![span(1)])),
            ],
        );
        assert_eq!(
            converter().units_of(&sect, &index),
            vec![
                ConversionUnit::Heading(2, "Title".into()),
                ConversionUnit::Paragraph("body".into()),
            ]
        );
    }

    #[test]
    fn test_unknown_leaf_renders_as_paragraph() {
        let index = index_of(&["stray"]);
        let node = elem(Tag::Unknown, "Weird", vec![span(0)]);
        assert_eq!(
            converter().units_of(&node, &index),
            vec![ConversionUnit::Paragraph("stray".into())]
        );
    }
}
