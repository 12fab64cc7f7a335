//! Overlay page rendering.
//!
//! The overlay is a standalone one-page PDF holding only the certificate text.
//! It is handed to the merger as an in-memory buffer and never written to disk.
//!
//! # Rendering Strategy
//!
//! 1. Resolve the layout policy against the request ([`OverlayLayout::plan`])
//! 2. Emit one `BT … ET` block per line, referencing the standard Helvetica
//!    faces by resource name
//! 3. Wrap the page in a minimal catalog and serialize it

use lopdf::{Dictionary, Document, Object, Stream};
use tracing::debug;

use crate::config::{CertificateConfig, TextColor};
use crate::error::{Error, Result};
use crate::request::CertificateRequest;
use super::font::{StandardFont, text_to_hex};
use super::layout::{OverlayLayout, PageSize, PlacedLine};

// =============================================================================
// Public Types
// =============================================================================

/// A rendered overlay: a complete one-page PDF held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPage {
    bytes: Vec<u8>,
    page_size: PageSize,
}

impl OverlayPage {
    /// Wrap an existing one-page PDF produced elsewhere.
    pub const fn from_bytes(bytes: Vec<u8>, page_size: PageSize) -> Self {
        Self { bytes, page_size }
    }

    /// Raw PDF bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

// =============================================================================
// Overlay Renderer
// =============================================================================

/// Renders certificate requests into overlay pages.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    layout: OverlayLayout,
    text_color: TextColor,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            layout: OverlayLayout::default(),
            text_color: TextColor::default(),
        }
    }
}

impl OverlayRenderer {
    /// Create a renderer, rejecting unusable layouts.
    pub fn new(layout: OverlayLayout, text_color: TextColor) -> Result<Self> {
        layout.validate()?;
        Ok(Self { layout, text_color })
    }

    pub fn from_config(config: &CertificateConfig) -> Result<Self> {
        Self::new(config.layout.clone(), config.text_color)
    }

    pub const fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    /// Render the overlay page for one request.
    pub fn render(&self, request: &CertificateRequest) -> Result<OverlayPage> {
        let lines = self.layout.plan(request);
        let content = self.create_overlay_content(&lines);
        let page_size = self.layout.page;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in StandardFont::ALL {
            let font_id = doc.add_object(font.font_dictionary());
            fonts.set(font.resource_name(), Object::Reference(font_id));
        }

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(page_size.media_box().into_iter().map(Object::Real).collect()),
            ),
            ("Contents", Object::Reference(content_id)),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([("Font", Object::Dictionary(fonts))])),
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

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| Error::OverlayRender(format!("Failed to save overlay PDF: {e}")))?;

        debug!(
            "Rendered overlay for '{}': {} lines, {} bytes",
            request.recipient,
            lines.len(),
            bytes.len()
        );

        Ok(OverlayPage { bytes, page_size })
    }

    /// Create the PDF content stream drawing every placed line.
    fn create_overlay_content(&self, lines: &[PlacedLine]) -> String {
        use std::fmt::Write;

        let mut content = String::new();

        content.push_str("q\n");

        let TextColor { r, g, b } = self.text_color.clamped();
        let _ = writeln!(content, "{r} {g} {b} rg");
        content.push_str("0 Tr\n");

        for line in lines {
            content.push_str("BT\n");
            let _ = writeln!(content, "/{} {} Tf", line.font.resource_name(), line.font_size);
            let _ = writeln!(content, "{:.2} {:.2} Td", line.x, line.y);
            let _ = writeln!(content, "<{}> Tj", text_to_hex(&line.text));
            content.push_str("ET\n");
        }

        content.push_str("Q\n");

        content
    }
}

/// Render an overlay with the default layout and colour.
pub fn render_overlay(request: &CertificateRequest) -> Result<OverlayPage> {
    OverlayRenderer::default().render(request)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::font::encode_win_ansi;
    use crate::request::Course;
    use lopdf::content::Content;

    fn sample_request() -> CertificateRequest {
        CertificateRequest::new(
            "Ana Silva",
            vec![Course::new("Lógica de Programação", 20.0)],
            "01/01/2024",
        )
    }

    /// Strings shown by `Tj` operators, in drawing order.
    fn shown_strings(overlay: &OverlayPage) -> Vec<Vec<u8>> {
        let doc = Document::load_mem(overlay.bytes()).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first())
            .filter_map(|obj| obj.as_str().ok())
            .map(<[u8]>::to_vec)
            .collect()
    }

    #[test]
    fn test_render_produces_single_page_pdf() {
        let overlay = render_overlay(&sample_request()).unwrap();
        assert!(overlay.bytes().starts_with(b"%PDF"));

        let doc = Document::load_mem(overlay.bytes()).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_render_media_box_matches_layout() {
        let overlay = render_overlay(&sample_request()).unwrap();
        let doc = Document::load_mem(overlay.bytes()).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let media_box = crate::pdf::document::media_box(&doc, page_id);
        let expected = PageSize::A4_LANDSCAPE.media_box();
        for (got, want) in media_box.iter().zip(expected) {
            assert!((got - want).abs() < 0.01);
        }
        assert_eq!(overlay.page_size(), PageSize::A4_LANDSCAPE);
    }

    #[test]
    fn test_render_shows_every_line() {
        let overlay = render_overlay(&sample_request()).unwrap();
        let expected: Vec<Vec<u8>> = [
            "Aluno: Ana Silva",
            "Data de Conclusão: 01/01/2024",
            "Cursos Concluídos:",
            "Lógica de Programação - 20 horas",
        ]
        .iter()
        .map(|s| encode_win_ansi(s))
        .collect();
        assert_eq!(shown_strings(&overlay), expected);
    }

    #[test]
    fn test_render_empty_course_list() {
        let request = CertificateRequest::new("Ana Silva", Vec::<Course>::new(), "01/01/2024");
        let overlay = render_overlay(&request).unwrap();
        assert_eq!(shown_strings(&overlay).len(), 3);
    }

    #[test]
    fn test_render_is_deterministic() {
        let first = render_overlay(&sample_request()).unwrap();
        let second = render_overlay(&sample_request()).unwrap();
        assert_eq!(shown_strings(&first), shown_strings(&second));
        assert_eq!(first.page_size(), second.page_size());
    }

    #[test]
    fn test_text_color_in_content() {
        let renderer = OverlayRenderer::new(OverlayLayout::default(), TextColor::dark_red()).unwrap();
        let content = renderer.create_overlay_content(&[]);
        assert!(content.contains("0.8 0 0 rg"));
        assert!(content.starts_with("q\n") && content.ends_with("Q\n"));
    }

    #[test]
    fn test_renderer_rejects_invalid_layout() {
        let mut layout = OverlayLayout::default();
        layout.page.height = 0.0;
        assert!(OverlayRenderer::new(layout, TextColor::black()).is_err());
    }
}
