//! Bounded indirect-reference resolution and page-object mapping.

use std::collections::HashMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// Maximum number of reference hops before a chain is declared runaway.
///
/// Reference chains must terminate; a cyclic chain is an unrecoverable
/// malformed-input condition and fails the whole document rather than loop.
pub const MAX_REF_HOPS: usize = 32;

/// Follow a reference chain until a concrete (non-reference) value.
///
/// # Returns
/// * `Ok(Some(obj))` - chain terminated at a concrete object
/// * `Ok(None)` - a reference in the chain does not resolve; the caller
///   treats the entry as absent, never as fatal
/// * `Err(Error::ReferenceLoop)` - the chain exceeded [`MAX_REF_HOPS`]
pub fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Result<Option<&'a Object>> {
    let mut current = obj;
    for _ in 0..MAX_REF_HOPS {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => {
                    log::debug!("dangling reference {:?}", id);
                    return Ok(None);
                }
            },
            _ => return Ok(Some(current)),
        }
    }
    Err(Error::ReferenceLoop(format!("{:?}", obj)))
}

/// Map every page object id to its 1-based document page number.
///
/// Structure-tree page references point to page objects, not page numbers;
/// this map is the inversion of the page-tree walk (nested `Pages`
/// containers included, handled by the document model).
pub fn page_index_map(doc: &LopdfDocument) -> HashMap<ObjectId, u32> {
    doc.get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect()
}
