//! Certificate Overlay Core Library
//!
//! This library stamps personalized certificate text onto a PDF template:
//! - Layout policy resolving a request into positioned lines
//! - Overlay rendering into an in-memory one-page PDF
//! - Compositing the overlay onto the template's first page
//! - Configuration loading

pub mod config;
pub mod error;
pub mod pdf;
pub mod request;
pub mod util;

pub use config::{CertificateConfig, TextColor};
pub use error::{Error, Result};
pub use pdf::{
    Field, LayoutEntry, MergeSummary, OverlayLayout, OverlayPage, OverlayRenderer, PageSize,
    StandardFont, TemplateDocument, merge_overlay, merge_overlay_bytes, render_overlay,
};
pub use request::{CertificateRequest, Course};

use std::path::Path;
use tracing::info;

/// High-level certificate generator that combines rendering and merging
#[derive(Debug, Clone)]
pub struct CertificateGenerator {
    renderer: OverlayRenderer,
    config: CertificateConfig,
}

impl CertificateGenerator {
    /// Create a new generator with the given configuration
    pub fn new(config: CertificateConfig) -> Result<Self> {
        config.validate()?;
        let renderer = OverlayRenderer::from_config(&config)?;
        Ok(Self { renderer, config })
    }

    /// Render the overlay page for a request without touching any template
    pub fn render(&self, request: &CertificateRequest) -> Result<OverlayPage> {
        self.renderer.render(request)
    }

    /// Render the overlay and merge it onto `template_path`, writing `output_path`
    pub fn generate(
        &self,
        request: &CertificateRequest,
        template_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<MergeSummary> {
        let template_path = template_path.as_ref();
        info!(
            "Generating certificate for '{}' from {}",
            request.recipient,
            template_path.display()
        );

        let overlay = self.render(request)?;
        merge_overlay(template_path, &overlay, output_path)
    }

    /// Render the overlay and merge it onto an in-memory template
    pub fn generate_bytes(&self, request: &CertificateRequest, template: &[u8]) -> Result<Vec<u8>> {
        let overlay = self.render(request)?;
        merge_overlay_bytes(template, &overlay)
    }

    pub const fn config(&self) -> &CertificateConfig {
        &self.config
    }
}
