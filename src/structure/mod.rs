//! Logical-structure-tree reading and span-based text reconstruction.

mod dump;
mod spans;
mod tag;
mod text;
mod tree;

pub use dump::{DumpChild, DumpNode, StructureDump};
pub use spans::SpanIndex;
pub use tag::Tag;
pub use text::{geometric_text, node_text, stream_text};
pub use tree::{read_structure_tree, NodeChild, StructureNode};
