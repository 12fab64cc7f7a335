mod document;
mod font;
mod layout;
pub mod merge;
pub mod overlay;

pub use document::TemplateDocument;
pub use font::{StandardFont, encode_win_ansi};
pub use layout::{Field, LayoutEntry, OverlayLayout, PageSize, PlacedLine};
pub use merge::{MergeSummary, merge_into_template, merge_overlay, merge_overlay_bytes};
pub use overlay::{OverlayPage, OverlayRenderer, render_overlay};
