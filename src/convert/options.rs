//! Compiled, immutable options for converting one document.

use std::collections::BTreeSet;

use crate::layout::LayoutParams;
use crate::render::JsonFormat;
use crate::structure::{LineFilter, TextFilter, TextNormalizer};

/// Options for converting a document.
///
/// Built once per document (or per collection when shared) and never
/// mutated while a conversion runs.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Line filter, `None` when filtering is disabled
    pub line_filter: Option<LineFilter>,

    /// Table-of-contents pages
    pub toc_pages: BTreeSet<u32>,

    /// Parameters forwarded to the layout provider
    pub layout_params: LayoutParams,

    /// Per-collection text filter run before normalization
    pub text_filter: Option<TextFilter>,

    /// JSON layout of the written structured document
    pub output_format: JsonFormat,
}

impl ConvertOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line filter.
    pub fn with_line_filter(mut self, filter: Option<LineFilter>) -> Self {
        self.line_filter = filter;
        self
    }

    /// Set the table-of-contents pages.
    pub fn with_toc_pages(mut self, pages: impl IntoIterator<Item = u32>) -> Self {
        self.toc_pages = pages.into_iter().collect();
        self
    }

    /// Set layout parameters.
    pub fn with_layout_params(mut self, params: LayoutParams) -> Self {
        self.layout_params = params;
        self
    }

    /// Set the custom text filter.
    pub fn with_text_filter(mut self, filter: Option<TextFilter>) -> Self {
        self.text_filter = filter;
        self
    }

    /// Set the output JSON format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Build the normalizer these options describe.
    pub fn normalizer(&self) -> TextNormalizer {
        TextNormalizer::new().with_filter(self.text_filter.clone())
    }
}
