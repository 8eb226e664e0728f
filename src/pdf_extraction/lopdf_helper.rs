// lopdf helper - Pure Rust PDF operations
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

use crate::types::Result;

/// Resource inheritance through `Parent` is bounded to guard against cycles.
const MAX_TREE_DEPTH: usize = 32;

/// Load a PDF document using lopdf
pub fn load_pdf(path: &Path) -> Result<Document> {
    Ok(Document::load(path)?)
}

/// Execute an operation with a PDF document. The document is dropped on
/// every exit path, including errors raised by `f`.
pub fn with_pdf<F, R>(path: &Path, f: F) -> Result<R>
where
    F: FnOnce(&Document) -> Result<R>,
{
    let document = load_pdf(path)?;
    f(&document)
}

/// Follow references until a direct object is reached.
pub fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => current = document.get_object(*id)?,
            _ => return Ok(current),
        }
    }
    Err(lopdf::Error::ReferenceLimit.into())
}

/// Like `resolve`, also returning the id of the last reference followed.
pub fn resolve_with_id<'a>(
    document: &'a Document,
    object: &'a Object,
) -> Result<(Option<ObjectId>, &'a Object)> {
    let mut id = None;
    let mut current = object;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(reference) => {
                id = Some(*reference);
                current = document.get_object(*reference)?;
            }
            _ => return Ok((id, current)),
        }
    }
    Err(lopdf::Error::ReferenceLimit.into())
}

/// Look up `key` in `dict`, resolving references. `None` when absent or
/// not a dictionary.
pub fn get_dict<'a>(document: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let object = dict.get(key).ok()?;
    resolve(document, object).ok()?.as_dict().ok()
}

/// Numeric value from a dictionary, resolving references.
pub fn get_number(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    let object = dict.get(key).ok()?;
    match resolve(document, object).ok()? {
        Object::Integer(i) => Some(*i),
        Object::Real(f) => Some(*f as i64),
        _ => None,
    }
}

/// Name value from a dictionary, resolving references.
pub fn get_name<'a>(document: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    let object = dict.get(key).ok()?;
    match resolve(document, object).ok()? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// The resource dictionary of a page, inherited from the nearest ancestor
/// `Pages` node when the page itself has none.
pub fn page_resources(document: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>> {
    let mut node = document.get_object(page_id)?.as_dict()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Some(resources) = get_dict(document, node, b"Resources") {
            return Ok(Some(resources));
        }
        match get_dict(document, node, b"Parent") {
            Some(parent) => node = parent,
            None => return Ok(None),
        }
    }
    Ok(None)
}

/// Filter names applied to a stream, in decode order.
pub fn stream_filters(document: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    let Ok(object) = dict.get(b"Filter") else {
        return Vec::new();
    };
    match resolve(document, object) {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match resolve(document, item) {
                Ok(Object::Name(name)) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
