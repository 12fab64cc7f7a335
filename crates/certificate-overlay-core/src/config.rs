use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pdf::OverlayLayout;

/// Text color for overlay lines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl TextColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn dark_red() -> Self {
        Self::new(0.8, 0.0, 0.0)
    }

    pub const fn navy() -> Self {
        Self::new(0.0, 0.0, 0.5)
    }

    pub const fn dark_green() -> Self {
        Self::new(0.0, 0.5, 0.0)
    }

    /// Components clamped to the 0.0-1.0 range PDF colour operators accept.
    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::black()
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// Overlay text color
    #[serde(default)]
    pub text_color: TextColor,

    /// chrono format string used when no completion date is supplied
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Line placement policy
    #[serde(default)]
    pub layout: OverlayLayout,
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            text_color: TextColor::default(),
            date_format: default_date_format(),
            layout: OverlayLayout::default(),
        }
    }
}

impl CertificateConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the layout policy and that `date_format` only uses known strftime specifiers.
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::ConfigInvalid {
                field: "date_format".to_string(),
                reason: format!("unsupported format specifier in '{}'", self.date_format),
            });
        }
        self.layout.validate()
    }

    /// Load from default locations (~/.config/certificate-overlay/config.toml, ./config.toml)
    pub fn load() -> Self {
        let candidates = crate::util::config_dir()
            .map(|dir| dir.join("certificate-overlay").join("config.toml"))
            .into_iter()
            .chain(std::iter::once(PathBuf::from("config.toml")));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", path.display(), e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}
