//! Glyph runs as produced by the layout provider.

use serde::{Deserialize, Serialize};

/// A style-homogeneous piece of one visual line.
///
/// A run ends whenever the font size changes within a line or the line ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphRun {
    /// Page index, in the provider's numbering
    pub page: u32,

    /// Rounded font size in points
    pub size: u32,

    /// Raw run text (may still contain newlines and artifacts)
    pub text: String,
}

impl GlyphRun {
    /// Create a new run.
    pub fn new(page: u32, size: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            size,
            text: text.into(),
        }
    }

    /// Check if the run carries no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<(u32, u32, &str)> for GlyphRun {
    fn from((page, size, text): (u32, u32, &str)) -> Self {
        Self::new(page, size, text)
    }
}
