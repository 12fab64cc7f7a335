use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for certificate-overlay-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Template loading (unreadable, malformed, or empty documents)
/// - Overlay rendering and compositing
/// - Writing the merged output
/// - Configuration operations (loading, validation)
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Template Errors
    // ==========================================================================
    /// Template is missing, unreadable, or not a valid PDF
    #[error("failed to open template: {0}")]
    TemplateOpen(String),

    /// Template has no pages, so there is no first page to merge onto
    #[error("template has no pages")]
    TemplateEmpty,

    // ==========================================================================
    // Overlay Errors
    // ==========================================================================
    /// Failed to build or serialize the overlay page
    #[error("failed to render overlay: {0}")]
    OverlayRender(String),

    /// Overlay buffer is not a usable one-page PDF
    #[error("invalid overlay page: {0}")]
    OverlayInvalid(String),

    /// Structural failure while compositing the overlay onto the template
    #[error("failed to merge overlay: {0}")]
    Merge(String),

    // ==========================================================================
    // Output Errors
    // ==========================================================================
    /// Output path could not be written
    #[error("failed to write output {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
