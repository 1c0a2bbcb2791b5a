//! Per-document conversion: layout runs in, structured document out.
//!
//! # Example
//!
//! ```no_run
//! use pdfchunk::convert::{ConvertOptions, Converter};
//! use std::path::Path;
//!
//! fn main() -> pdfchunk::Result<()> {
//!     let converter = Converter::new();
//!     let options = ConvertOptions::new().with_toc_pages([2, 3]);
//!     let doc = converter.convert_to_file(
//!         Path::new("report.layout.json"),
//!         Path::new("report_structured.json"),
//!         &options,
//!     )?;
//!     println!("{} chunks", doc.chunks.len());
//!     Ok(())
//! }
//! ```

pub mod batch;
mod options;

pub use batch::{BatchEvent, BatchReport, BatchRunner, Collection, DocumentJob, DocumentResult};
pub use options::ConvertOptions;

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::layout::{JsonLayoutProvider, LayoutProvider};
use crate::model::{GlyphRun, StructuredDocument};
use crate::render::write_json;
use crate::structure::merge_runs;

/// Converts documents using a layout provider.
#[derive(Clone)]
pub struct Converter {
    provider: Arc<dyn LayoutProvider>,
}

impl Converter {
    /// Create a converter reading JSON layout dumps.
    pub fn new() -> Self {
        Self::with_provider(Arc::new(JsonLayoutProvider::new()))
    }

    /// Create a converter with a custom layout provider.
    pub fn with_provider(provider: Arc<dyn LayoutProvider>) -> Self {
        Self { provider }
    }

    /// The layout provider in use.
    pub fn provider(&self) -> &dyn LayoutProvider {
        self.provider.as_ref()
    }

    /// Run filter, merge and normalization over an in-memory run sequence.
    pub fn convert_runs(&self, runs: Vec<GlyphRun>, options: &ConvertOptions) -> StructuredDocument {
        let runs = match &options.line_filter {
            Some(filter) => filter.apply(runs),
            None => runs,
        };
        let normalizer = options.normalizer();
        merge_runs(runs, &options.toc_pages, &normalizer)
    }

    /// Convert the document at `source`.
    pub fn convert_file(&self, source: &Path, options: &ConvertOptions) -> Result<StructuredDocument> {
        log::info!("converting {}...", source.display());
        let runs = self.provider.runs(source, &options.layout_params)?;
        log::debug!("{}: {} runs from {} provider", source.display(), runs.len(), self.provider.name());
        Ok(self.convert_runs(runs, options))
    }

    /// Convert the document at `source` and write it to `output`.
    pub fn convert_to_file(
        &self,
        source: &Path,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<StructuredDocument> {
        let doc = self.convert_file(source, options)?;
        write_json(output, &doc, options.output_format)?;
        Ok(doc)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("provider", &self.provider.name())
            .finish()
    }
}
