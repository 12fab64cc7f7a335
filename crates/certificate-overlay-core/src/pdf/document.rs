use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Maximum number of `/Parent` hops followed when looking up inherited
/// page attributes. Guards against circular page trees.
const MAX_INHERIT_DEPTH: usize = 10;

/// MediaBox used when neither the page nor its ancestors declare one.
const FALLBACK_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// A parsed template PDF, treated as read-only input to the merger.
pub struct TemplateDocument {
    doc: Document,
    /// Where the template came from, for log and error messages
    source: String,
}

impl TemplateDocument {
    /// Parse a template from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::parse(bytes, "<memory>".to_string())
    }

    /// Read and parse a template from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::TemplateOpen(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        Self::parse(&bytes, path.display().to_string())
    }

    fn parse(bytes: &[u8], source: String) -> Result<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| Error::TemplateOpen(format!("Failed to parse {source}: {e}")))?;
        Ok(Self { doc, source })
    }

    /// Get number of pages
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Object ID of the first page.
    ///
    /// Fails with [`Error::TemplateEmpty`] when the page tree has no pages.
    pub fn first_page(&self) -> Result<ObjectId> {
        self.doc
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or(Error::TemplateEmpty)
    }

    /// MediaBox of a page, following inheritance from the page tree.
    pub fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        media_box(&self.doc, page_id)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) const fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }
}

impl std::fmt::Debug for TemplateDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateDocument")
            .field("source", &self.source)
            .field("page_count", &self.page_count())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Page Attribute Helpers
// =============================================================================

/// Get the MediaBox of a page, walking up the Pages tree if it is inherited.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| rect_from_object(doc, &obj))
        .unwrap_or(FALLBACK_MEDIA_BOX)
}

fn rect_from_object(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let arr = match obj {
        Object::Array(arr) => arr,
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        _ => return None,
    };

    let values: Vec<f32> = arr
        .iter()
        .filter_map(|o| match o {
            #[allow(clippy::cast_precision_loss)]
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r),
            _ => None,
        })
        .collect();

    match values.as_slice() {
        &[x0, y0, x1, y1] => Some([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]),
        _ => None,
    }
}

/// Resolve the Resources dictionary for a page as an owned copy.
///
/// PDF pages can have Resources as:
/// - An inline dictionary: `/Resources << /Font << ... >> >>`
/// - An indirect reference: `/Resources 5 0 R`
/// - Inherited from a parent Pages node
///
/// The copy is detached from the source object, so modifying it never
/// affects other pages sharing the same resources.
pub(crate) fn resolve_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| resolve_dict_object(doc, &obj))
        .unwrap_or_default()
}

/// Resolve an object that should be a Dictionary (handles References).
pub(crate) fn resolve_dict_object(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(ref_id) => match doc.get_object(*ref_id) {
            Ok(Object::Dictionary(d)) => Some(d.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Look up a page attribute, falling back to ancestor Pages nodes.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node_id = page_id;

    for _ in 0..MAX_INHERIT_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;

        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }

        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }

    None
}
