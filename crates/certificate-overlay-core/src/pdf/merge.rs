//! Compositing an overlay page onto the first page of a template.
//!
//! # Merge Strategy
//!
//! The overlay page is imported into the template as a Form XObject and drawn
//! after the template's own first-page content:
//!
//! ```text
//! q                      % new stream
//! ...original content... % untouched streams, isolated by q/Q
//! Q q /CertOverlay0 Do Q % new stream
//! ```
//!
//! Only the first page's dictionary is modified. Its resources are copied
//! inline before the XObject is registered, so dictionaries shared with other
//! pages stay exactly as they were. Pages 2..N are never touched.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use crate::error::{Error, Result};
use super::document::{TemplateDocument, media_box, resolve_dict_object, resolve_resources};
use super::overlay::OverlayPage;

/// Prefix for the XObject resource name registered on the first page.
const OVERLAY_XOBJECT_PREFIX: &str = "CertOverlay";

/// Outcome of a successful merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Pages in the output, always equal to the template's page count
    pub page_count: usize,
    pub bytes_written: usize,
}

/// Merge an overlay onto a template file and write the result to `output_path`.
///
/// The output is fully serialized in memory before the file is created, so
/// nothing is written unless serialization succeeds.
pub fn merge_overlay(
    template_path: impl AsRef<Path>,
    overlay: &OverlayPage,
    output_path: impl AsRef<Path>,
) -> Result<MergeSummary> {
    let output_path = output_path.as_ref();
    let template = TemplateDocument::from_file(template_path)?;
    let page_count = template.page_count();

    let bytes = merge_into_template(template, overlay)?;

    std::fs::write(output_path, &bytes).map_err(|source| Error::OutputWrite {
        path: output_path.to_path_buf(),
        source,
    })?;

    info!(
        "Wrote {} ({} pages, {} bytes)",
        output_path.display(),
        page_count,
        bytes.len()
    );

    Ok(MergeSummary {
        page_count,
        bytes_written: bytes.len(),
    })
}

/// Merge an overlay onto a template held in memory. Returns the merged PDF bytes.
pub fn merge_overlay_bytes(template_bytes: &[u8], overlay: &OverlayPage) -> Result<Vec<u8>> {
    merge_into_template(TemplateDocument::from_bytes(template_bytes)?, overlay)
}

/// Composite the overlay onto the template's first page and serialize the result.
pub fn merge_into_template(mut template: TemplateDocument, overlay: &OverlayPage) -> Result<Vec<u8>> {
    let first_page = template.first_page()?;
    let source = template.source().to_string();
    let [llx, lly, _, _] = template.media_box(first_page);

    let doc = template.document_mut();
    let form_id = import_overlay_form(doc, overlay, (llx, lly))?;
    let name = register_xobject(doc, first_page, form_id)?;
    wrap_page_contents(doc, first_page, &name)?;

    debug!("Composited overlay as /{} onto first page of {}", name, source);

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::Merge(format!("Failed to save merged PDF: {e}")))?;

    Ok(output)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Copy the overlay's objects into `doc` and wrap its page as a Form XObject.
fn import_overlay_form(doc: &mut Document, overlay: &OverlayPage, origin: (f32, f32)) -> Result<ObjectId> {
    let mut overlay_doc = Document::load_mem(overlay.bytes())
        .map_err(|e| Error::OverlayInvalid(format!("Failed to load overlay: {e}")))?;

    let page_count = overlay_doc.get_pages().len();
    if page_count != 1 {
        return Err(Error::OverlayInvalid(format!(
            "expected exactly one page, found {page_count}"
        )));
    }

    overlay_doc.renumber_objects_with(doc.max_id + 1);

    let page_id = overlay_doc
        .get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| Error::OverlayInvalid("overlay page disappeared".to_string()))?;

    let content = overlay_doc
        .get_page_content(page_id)
        .map_err(|e| Error::OverlayInvalid(format!("Failed to read overlay content: {e}")))?;
    let resources = resolve_resources(&overlay_doc, page_id);
    let bbox = media_box(&overlay_doc, page_id);
    let content_ids = overlay_doc.get_page_contents(page_id);

    // Fonts and other resources move over; the page tree and the raw content
    // streams are replaced by the form
    for (object_id, object) in std::mem::take(&mut overlay_doc.objects) {
        if content_ids.contains(&object_id) {
            continue;
        }
        match object.type_name().unwrap_or(b"") {
            b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                doc.objects.insert(object_id, object);
            }
        }
    }
    doc.max_id = doc.max_id.max(overlay_doc.max_id);

    let mut form_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Form".to_vec())),
        ("FormType", Object::Integer(1)),
        ("BBox", Object::Array(bbox.into_iter().map(Object::Real).collect())),
        ("Resources", Object::Dictionary(resources)),
    ]);

    // Place the overlay's origin on the template's lower-left corner
    let (llx, lly) = origin;
    if llx.abs() > f32::EPSILON || lly.abs() > f32::EPSILON {
        form_dict.set(
            "Matrix",
            Object::Array(vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Real(llx),
                Object::Real(lly),
            ]),
        );
    }

    Ok(doc.add_object(Stream::new(form_dict, content)))
}

/// Register the form under a free name in the page's own copy of its resources.
fn register_xobject(doc: &mut Document, page_id: ObjectId, form_id: ObjectId) -> Result<String> {
    let mut resources = resolve_resources(doc, page_id);

    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dict_object(doc, obj))
        .unwrap_or_default();

    let name = unused_name(&xobjects);
    xobjects.set(name.as_str(), Object::Reference(form_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));

    Ok(name)
}

fn unused_name(xobjects: &Dictionary) -> String {
    let mut index = 0_usize;
    loop {
        let name = format!("{OVERLAY_XOBJECT_PREFIX}{index}");
        if !xobjects.has(name.as_bytes()) {
            return name;
        }
        index += 1;
    }
}

/// Surround the existing content with `q … Q` and draw the form after it.
fn wrap_page_contents(doc: &mut Document, page_id: ObjectId, xobject_name: &str) -> Result<()> {
    let existing = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| Error::Merge(format!("Failed to get page: {e}")))?;

        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(arr)) => arr.clone(),
            _ => Vec::new(),
        }
    };

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let draw = format!("\nQ\nq\n/{xobject_name} Do\nQ\n");
    let draw_id = doc.add_object(Stream::new(Dictionary::new(), draw.into_bytes()));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(draw_id));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));

    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| Error::Merge(format!("Failed to get page: {e}")))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::overlay::render_overlay;
    use crate::request::CertificateRequest;
    use lopdf::content::Content;

    fn overlay() -> OverlayPage {
        let request = CertificateRequest::new("Ana Silva", [("Redes", 60_u32)], "01/01/2024");
        render_overlay(&request).unwrap()
    }

    /// Single-page template whose page carries an existing XObject named like ours.
    fn template_with_name_clash() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"0 0 1 rg 0 0 10 10 re f".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            (
                "MediaBox",
                Object::Array(vec![10.into(), 20.into(), 852.into(), 615.into()]),
            ),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([(
                    "XObject",
                    Object::Dictionary(Dictionary::from_iter([(
                        "CertOverlay0",
                        Object::Reference(content_id),
                    )])),
                )])),
            ),
        ]));
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_unused_name_skips_existing() {
        let mut xobjects = Dictionary::new();
        assert_eq!(unused_name(&xobjects), "CertOverlay0");
        xobjects.set("CertOverlay0", Object::Null);
        xobjects.set("CertOverlay1", Object::Null);
        assert_eq!(unused_name(&xobjects), "CertOverlay2");
    }

    #[test]
    fn test_merge_registers_form_and_wraps_content() {
        let merged = merge_overlay_bytes(&template_with_name_clash(), &overlay()).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();

        let resources = resolve_resources(&doc, page_id);
        let xobjects = resolve_dict_object(&doc, resources.get(b"XObject").unwrap()).unwrap();
        assert!(xobjects.has(b"CertOverlay0"));
        let form_id = xobjects.get(b"CertOverlay1").unwrap().as_reference().unwrap();
        let form = doc.get_object(form_id).unwrap().as_stream().unwrap();
        assert_eq!(form.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");

        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let operators: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators.first(), Some(&"q"));
        assert_eq!(operators.last(), Some(&"Q"));
        assert!(operators.contains(&"re"), "original artwork lost");
        assert!(operators.contains(&"Do"), "overlay not drawn");
    }

    #[test]
    fn test_merge_offsets_form_to_media_box_origin() {
        let merged = merge_overlay_bytes(&template_with_name_clash(), &overlay()).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();

        let resources = resolve_resources(&doc, page_id);
        let xobjects = resolve_dict_object(&doc, resources.get(b"XObject").unwrap()).unwrap();
        let form_id = xobjects.get(b"CertOverlay1").unwrap().as_reference().unwrap();
        let form = doc.get_object(form_id).unwrap().as_stream().unwrap();
        let matrix = form.dict.get(b"Matrix").unwrap().as_array().unwrap();
        assert_eq!(matrix.len(), 6);
        assert!((matrix[4].as_float().unwrap() - 10.0).abs() < f32::EPSILON);
        assert!((matrix[5].as_float().unwrap() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_merge_rejects_multi_page_overlay() {
        let mut two_page = Document::load_mem(&template_with_name_clash()).unwrap();
        let first = *two_page.get_pages().values().next().unwrap();
        let pages_id = two_page
            .get_dictionary(first)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();
        let page_copy = two_page.get_object(first).unwrap().clone();
        let clone_id = two_page.add_object(page_copy);
        let pages = two_page.get_object_mut(pages_id).unwrap().as_dict_mut().unwrap();
        pages.set(
            "Kids",
            Object::Array(vec![Object::Reference(first), Object::Reference(clone_id)]),
        );
        pages.set("Count", Object::Integer(2));
        let mut bytes = Vec::new();
        two_page.save_to(&mut bytes).unwrap();

        let bogus = OverlayPage::from_bytes(bytes, crate::pdf::PageSize::default());
        let result = merge_overlay_bytes(&template_with_name_clash(), &bogus);
        assert!(matches!(result, Err(Error::OverlayInvalid(_))));
    }

    #[test]
    fn test_merge_rejects_garbage_overlay() {
        let bogus = OverlayPage::from_bytes(b"not a pdf".to_vec(), crate::pdf::PageSize::default());
        let result = merge_overlay_bytes(&template_with_name_clash(), &bogus);
        assert!(matches!(result, Err(Error::OverlayInvalid(_))));
    }
}
