//! Read-only diagnostic serialization of the structure tree.
//!
//! A reporting path over the same parsed tree the converter uses; it has
//! no effect on conversion output.

use std::collections::BTreeMap;

use serde::Serialize;

use super::tree::{NodeChild, StructureNode};

/// JSON-serializable view of a parsed structure tree.
#[derive(Debug, Serialize)]
pub struct StructureDump {
    /// Raw tag names and how often each occurs.
    pub tag_counts: BTreeMap<String, usize>,
    /// The tree itself, nesting and span linkage preserved.
    pub root: DumpNode,
}

#[derive(Debug, Serialize)]
pub struct DumpNode {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DumpChild>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DumpChild {
    Node(DumpNode),
    Span { page: u32, mcid: i64 },
}

impl StructureDump {
    /// Build the diagnostic view of a parsed tree.
    pub fn from_tree(root: &StructureNode) -> Self {
        let mut tag_counts = BTreeMap::new();
        count_tags(root, &mut tag_counts);
        StructureDump {
            tag_counts,
            root: dump_node(root),
        }
    }
}

/// Histogram over element tags; the synthetic root is not counted.
fn count_tags(node: &StructureNode, counts: &mut BTreeMap<String, usize>) {
    for child in node.child_nodes() {
        *counts.entry(child.raw_tag.clone()).or_insert(0) += 1;
        count_tags(child, counts);
    }
}

fn dump_node(node: &StructureNode) -> DumpNode {
    DumpNode {
        tag: node.raw_tag.clone(),
        page: (node.page != 0).then_some(node.page),
        actual_text: node.actual_text.clone(),
        children: node
            .children
            .iter()
            .map(|child| match child {
                NodeChild::Node(n) => DumpChild::Node(dump_node(n)),
                NodeChild::Span { page, mcid } => DumpChild::Span {
                    page: *page,
                    mcid: *mcid,
                },
            })
            .collect(),
    }
}
