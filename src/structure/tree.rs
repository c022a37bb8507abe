//! Logical-structure-tree parsing.
//!
//! Walks the catalog's structure-tree root into an immutable node graph:
//! tags are alias-resolved through the role map, page references are
//! translated to 1-based page numbers, and leaf references bind to
//! page-scoped marked-content identifiers. Child order is trusted as
//! authorial reading order; nothing is sorted here.

use std::collections::HashMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::parser::{decode_text_simple, page_index_map, resolve};

use super::tag::Tag;

/// Maximum nesting depth of the kids walk.
///
/// The tree is required to be acyclic; a walk that goes this deep is a
/// malformed document and fails the parse rather than recurse unbounded.
const MAX_TREE_DEPTH: usize = 256;

/// One element of the logical-structure tree.
///
/// Built once per document, immutable thereafter. A node's full textual
/// content is the concatenation, in `children` order, of its direct span
/// references and its child nodes' content.
#[derive(Debug, Clone)]
pub struct StructureNode {
    /// Semantic role after alias remapping.
    pub tag: Tag,
    /// Tag name as written in the document, before remapping.
    pub raw_tag: String,
    /// 1-based page number; 0 is reserved for "unresolved".
    pub page: u32,
    /// Direct text override, bypassing glyph reconstruction.
    pub actual_text: Option<String>,
    /// Child nodes and span references interleaved in document order.
    pub children: Vec<NodeChild>,
}

/// One entry of a node's kids collection.
#[derive(Debug, Clone)]
pub enum NodeChild {
    /// A nested structure element.
    Node(StructureNode),
    /// A reference to a marked-content span.
    Span {
        /// 1-based page the span lives on.
        page: u32,
        /// Page-scoped span identifier.
        mcid: i64,
    },
}

impl StructureNode {
    /// Whether any direct child is a structure element.
    ///
    /// Span references never appear above the elements that own them, so
    /// a root with no element child has no elements anywhere. An empty or
    /// alias-only tree counts as absent for strategy selection.
    pub fn has_elements(&self) -> bool {
        self.children
            .iter()
            .any(|c| matches!(c, NodeChild::Node(_)))
    }

    /// Iterate over direct child nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = &StructureNode> {
        self.children.iter().filter_map(|c| match c {
            NodeChild::Node(n) => Some(n),
            NodeChild::Span { .. } => None,
        })
    }
}

/// Parse the document's structure tree, if it has one.
///
/// Returns `Ok(None)` when the catalog carries no structure-tree root or
/// the root does not resolve. Reference loops and over-deep nesting are
/// fatal; everything else degrades to a smaller tree.
pub fn read_structure_tree(doc: &LopdfDocument) -> Result<Option<StructureNode>> {
    let catalog = doc.catalog()?;
    let Ok(root_ref) = catalog.get(b"StructTreeRoot") else {
        return Ok(None);
    };
    let Some(Object::Dictionary(root_dict)) = resolve(doc, root_ref)? else {
        log::debug!("structure-tree root does not resolve to a dictionary");
        return Ok(None);
    };

    let walker = TreeWalker {
        doc,
        role_map: read_role_map(doc, root_dict)?,
        page_map: page_index_map(doc),
    };

    let mut root = StructureNode {
        tag: Tag::Container,
        raw_tag: "StructTreeRoot".to_string(),
        page: 0,
        actual_text: None,
        children: Vec::new(),
    };
    if let Ok(kids) = root_dict.get(b"K") {
        walker.walk_kids(kids, &mut root, 0)?;
    }
    Ok(Some(root))
}

/// Parse the alias table mapping custom tag names to canonical ones.
fn read_role_map(doc: &LopdfDocument, root: &Dictionary) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    let Ok(entry) = root.get(b"RoleMap") else {
        return Ok(map);
    };
    let Some(Object::Dictionary(dict)) = resolve(doc, entry)? else {
        return Ok(map);
    };
    for (name, value) in dict.iter() {
        if let Ok(target) = value.as_name() {
            map.insert(
                String::from_utf8_lossy(name).to_string(),
                String::from_utf8_lossy(target).to_string(),
            );
        }
    }
    Ok(map)
}

struct TreeWalker<'a> {
    doc: &'a LopdfDocument,
    role_map: HashMap<String, String>,
    page_map: HashMap<ObjectId, u32>,
}

impl TreeWalker<'_> {
    /// Recursively flatten a kids entry into a node's children.
    ///
    /// A bare integer is a span reference inheriting the node's page; an
    /// array flattens in order; a dictionary is either a nested element, a
    /// marked-content reference, or an object reference (skipped).
    fn walk_kids(&self, kids: &Object, parent: &mut StructureNode, depth: usize) -> Result<()> {
        if depth > MAX_TREE_DEPTH {
            return Err(Error::Corrupted(
                "structure-tree nesting exceeds depth bound".to_string(),
            ));
        }

        let Some(kids) = resolve(self.doc, kids)? else {
            return Ok(());
        };
        match kids {
            Object::Integer(mcid) => {
                parent.children.push(NodeChild::Span {
                    page: parent.page,
                    mcid: *mcid,
                });
            }
            Object::Array(items) => {
                for item in items {
                    self.walk_kids(item, parent, depth + 1)?;
                }
            }
            Object::Dictionary(dict) => self.walk_dict(dict, parent, depth)?,
            _ => {
                log::debug!("unexpected kids entry in structure tree");
            }
        }
        Ok(())
    }

    fn walk_dict(&self, dict: &Dictionary, parent: &mut StructureNode, depth: usize) -> Result<()> {
        if let Ok(type_name) = dict.get(b"Type").and_then(|t| t.as_name()) {
            match type_name {
                b"MCR" => {
                    self.push_span_ref(dict, parent)?;
                    return Ok(());
                }
                // Object references (annotations, XObjects) carry no text.
                b"OBJR" => return Ok(()),
                _ => {}
            }
        }

        if dict.get(b"S").is_ok() {
            let node = self.parse_element(dict, parent.page, depth)?;
            parent.children.push(NodeChild::Node(node));
        } else if dict.get(b"MCID").is_ok() {
            // Span reference without structural type.
            self.push_span_ref(dict, parent)?;
        } else {
            log::debug!("skipping kids dictionary with neither /S nor /MCID");
        }
        Ok(())
    }

    /// A span reference binds to the enclosing node's page when that page
    /// is known; its own page entry is consulted only as a fallback.
    fn push_span_ref(&self, dict: &Dictionary, parent: &mut StructureNode) -> Result<()> {
        let Some(mcid) = self.span_mcid(dict)? else {
            return Ok(());
        };
        let page = if parent.page != 0 {
            parent.page
        } else {
            self.page_of(dict)?.unwrap_or(0)
        };
        parent.children.push(NodeChild::Span { page, mcid });
        Ok(())
    }

    fn span_mcid(&self, dict: &Dictionary) -> Result<Option<i64>> {
        let Ok(entry) = dict.get(b"MCID") else {
            return Ok(None);
        };
        match resolve(self.doc, entry)? {
            Some(Object::Integer(mcid)) => Ok(Some(*mcid)),
            _ => Ok(None),
        }
    }

    /// Look up the 1-based page number of a `/Pg` entry, if present and
    /// pointing at a real page object.
    fn page_of(&self, dict: &Dictionary) -> Result<Option<u32>> {
        let Ok(entry) = dict.get(b"Pg") else {
            return Ok(None);
        };
        if let Object::Reference(id) = entry {
            return Ok(self.page_map.get(id).copied());
        }
        Ok(None)
    }

    fn parse_element(
        &self,
        dict: &Dictionary,
        inherited_page: u32,
        depth: usize,
    ) -> Result<StructureNode> {
        let raw_tag = match dict.get(b"S").ok().map(|s| resolve(self.doc, s)) {
            Some(Ok(Some(Object::Name(name)))) => String::from_utf8_lossy(name).to_string(),
            _ => String::new(),
        };
        let tag = Tag::classify(&raw_tag, &self.role_map);

        // An explicit page reference overrides the inherited page for this
        // element and its descendants.
        let page = self.page_of(dict)?.unwrap_or(inherited_page);

        let actual_text = dict.get(b"ActualText").ok().and_then(|o| {
            match resolve(self.doc, o) {
                Ok(Some(Object::String(bytes, _))) => Some(decode_text_simple(bytes)),
                _ => None,
            }
        });

        let mut node = StructureNode {
            tag,
            raw_tag,
            page,
            actual_text,
            children: Vec::new(),
        };
        if let Ok(kids) = dict.get(b"K") {
            self.walk_kids(kids, &mut node, depth + 1)?;
        }
        Ok(node)
    }
}
