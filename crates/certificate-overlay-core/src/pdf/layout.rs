//! Layout policy for certificate overlay text.
//!
//! # Coordinate System
//!
//! Layout entries are configured with an `offset` measured **down from the top
//! edge** of the page, which is how a designer reads a template. PDF content
//! streams use a **bottom-left origin** where Y increases upward, so every
//! entry is converted with:
//! ```text
//! pdf_y = page_height - offset
//! ```
//!
//! Lines are always centred horizontally. Long course lists are not paginated:
//! lines whose baseline falls below the page bottom are still emitted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::request::CertificateRequest;
use super::font::StandardFont;

// =============================================================================
// Page Geometry
// =============================================================================

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 in portrait orientation.
    pub const A4: Self = Self::new(595.275_6, 841.889_76);

    /// ISO A4 in landscape orientation.
    pub const A4_LANDSCAPE: Self = Self::A4.landscape();

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The same size with the longer side horizontal.
    pub const fn landscape(self) -> Self {
        if self.width >= self.height {
            self
        } else {
            Self::new(self.height, self.width)
        }
    }

    /// MediaBox array `[0 0 width height]`.
    pub const fn media_box(self) -> [f32; 4] {
        [0.0, 0.0, self.width, self.height]
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4_LANDSCAPE
    }
}

// =============================================================================
// Layout Policy
// =============================================================================

/// Which part of the request a layout entry prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Recipient,
    CompletionDate,
    CoursesHeader,
    /// Expands to one line per course.
    Courses,
}

/// One line (or, for [`Field::Courses`], one block of lines) on the overlay.
///
/// `template` supports the placeholders `{name}`, `{date}`, and for course
/// lines `{course}` and `{hours}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub field: Field,
    pub template: String,
    /// Distance from the top edge of the page to the text baseline, in points.
    pub offset: f32,
    pub font: StandardFont,
    pub font_size: f32,
}

impl LayoutEntry {
    pub fn new(
        field: Field,
        template: impl Into<String>,
        offset: f32,
        font: StandardFont,
        font_size: f32,
    ) -> Self {
        Self {
            field,
            template: template.into(),
            offset,
            font,
            font_size,
        }
    }
}

/// Ordered layout policy driving the overlay renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayLayout {
    pub page: PageSize,
    pub entries: Vec<LayoutEntry>,
    /// Vertical distance between consecutive course lines, in points.
    pub course_spacing: f32,
}

const fn default_course_spacing() -> f32 {
    20.0
}

fn default_entries() -> Vec<LayoutEntry> {
    vec![
        LayoutEntry::new(Field::Recipient, "Aluno: {name}", 200.0, StandardFont::Helvetica, 16.0),
        LayoutEntry::new(
            Field::CompletionDate,
            "Data de Conclusão: {date}",
            230.0,
            StandardFont::Helvetica,
            16.0,
        ),
        LayoutEntry::new(
            Field::CoursesHeader,
            "Cursos Concluídos:",
            280.0,
            StandardFont::HelveticaBold,
            16.0,
        ),
        LayoutEntry::new(
            Field::Courses,
            "{course} - {hours} horas",
            310.0,
            StandardFont::Helvetica,
            14.0,
        ),
    ]
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            page: PageSize::default(),
            entries: default_entries(),
            course_spacing: default_course_spacing(),
        }
    }
}

/// A fully resolved line of overlay text in PDF coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Left edge of the text, in points from the left of the page.
    pub x: f32,
    /// Baseline, in points from the bottom of the page.
    pub y: f32,
    pub font: StandardFont,
    pub font_size: f32,
}

impl OverlayLayout {
    /// Check that every dimension in the policy is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.page.width.is_finite() && self.page.width > 0.0) {
            return Err(invalid("layout.page.width", "must be a positive number"));
        }
        if !(self.page.height.is_finite() && self.page.height > 0.0) {
            return Err(invalid("layout.page.height", "must be a positive number"));
        }
        if !(self.course_spacing.is_finite() && self.course_spacing >= 0.0) {
            return Err(invalid("layout.course_spacing", "must be zero or a positive number"));
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if !entry.offset.is_finite() {
                return Err(invalid(format!("layout.entries[{i}].offset"), "must be finite"));
            }
            if !(entry.font_size.is_finite() && entry.font_size > 0.0) {
                return Err(invalid(
                    format!("layout.entries[{i}].font_size"),
                    "must be a positive number",
                ));
            }
        }

        Ok(())
    }

    /// Resolve every entry against a request, in policy order.
    pub fn plan(&self, request: &CertificateRequest) -> Vec<PlacedLine> {
        let mut lines = Vec::with_capacity(self.entries.len() + request.courses.len());

        for entry in &self.entries {
            match entry.field {
                Field::Courses => {
                    for (i, course) in request.courses.iter().enumerate() {
                        let hours = course.hours.to_string();
                        let text = fill_template(
                            &entry.template,
                            &[
                                ("course", course.name.as_str()),
                                ("hours", hours.as_str()),
                                ("name", request.recipient.as_str()),
                                ("date", request.completion_date.as_str()),
                            ],
                        );
                        #[allow(clippy::cast_precision_loss)]
                        let offset = entry.offset + i as f32 * self.course_spacing;
                        lines.push(self.place(text, offset, entry));
                    }
                }
                Field::Recipient | Field::CompletionDate | Field::CoursesHeader => {
                    let text = fill_template(
                        &entry.template,
                        &[
                            ("name", request.recipient.as_str()),
                            ("date", request.completion_date.as_str()),
                        ],
                    );
                    lines.push(self.place(text, entry.offset, entry));
                }
            }
        }

        let below_page = lines.iter().filter(|l| l.y < 0.0).count();
        if below_page > 0 {
            debug!("{} overlay line(s) fall below the bottom of the page", below_page);
        }

        lines
    }

    fn place(&self, text: String, offset: f32, entry: &LayoutEntry) -> PlacedLine {
        let width = entry.font.string_width(&text, entry.font_size);
        PlacedLine {
            x: self.page.width / 2.0 - width / 2.0,
            y: self.page.height - offset,
            text,
            font: entry.font,
            font_size: entry.font_size,
        }
    }
}

fn invalid(field: impl Into<String>, reason: &str) -> Error {
    Error::ConfigInvalid {
        field: field.into(),
        reason: reason.to_string(),
    }
}

/// Replace `{key}` placeholders in a single pass.
///
/// Substituted values are never rescanned, and unknown placeholders are left
/// as written.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let matched = vars.iter().find(|(key, _)| {
            tail.strip_prefix(key).is_some_and(|after| after.starts_with('}'))
        });

        if let Some((key, value)) = matched {
            out.push_str(value);
            rest = &tail[key.len() + 1..];
        } else {
            out.push('{');
            rest = tail;
        }
    }

    out.push_str(rest);
    out
}
