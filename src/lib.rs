//! # pdfchunk
//!
//! Turns report PDFs into header/paragraph text pairs.
//!
//! Conversion works on the glyph runs a layout engine produces for each
//! document. Runs that share a font size are merged into chunks, noise is
//! filtered by page, pattern and font size, and text is normalized. The
//! result is one structured JSON document per source. The pairing stage
//! reads those documents back, marks chunks larger than the body text as
//! headings, and attaches each paragraph to the heading before it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfchunk::{convert_file, pair_file, ConvertConfig, PairingMode};
//!
//! fn main() -> pdfchunk::Result<()> {
//!     let config = ConvertConfig::from_file("reports.conf")?;
//!     convert_file("ieo2016.layout.json", "ieo2016_structured.json", &config)?;
//!
//!     for pair in pair_file("ieo2016_structured.json", PairingMode::Compatible)? {
//!         println!("{:?} => {:?}", pair.header, pair.paragraph);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Run merging**: font-size boundaries become chunk boundaries
//! - **Filtering**: page ranges, anchored text patterns, font-size allowlists
//! - **Table of contents**: raw snapshots of chunks on TOC pages
//! - **Parallel batches**: one worker pool per collection, per-document failures
//! - **Corpus assembly**: heading detection and header/paragraph pairing

pub mod config;
pub mod convert;
pub mod corpus;
pub mod error;
pub mod layout;
pub mod model;
pub mod render;
pub mod structure;

// Re-export commonly used types
pub use config::ConvertConfig;
pub use convert::{
    BatchEvent, BatchReport, BatchRunner, Collection, ConvertOptions, Converter, DocumentResult,
};
pub use corpus::{
    pair_document, Corpus, CorpusBuilder, CorpusOptions, FontSizeClassifier,
    HeaderParagraphPairer, PairingMode, YearMap,
};
pub use error::{Error, Result};
pub use layout::{JsonLayoutProvider, LayoutParams, LayoutProvider};
pub use model::{
    Chunk, ClassifiedChunk, CorpusRow, GlyphRun, HeaderParagraphPair, Role, SourceInfo,
    StructuredDocument, TocEntry,
};
pub use render::JsonFormat;
pub use structure::{CaptionFilter, LineFilter, TextFilter, TextNormalizer};

use std::path::Path;

/// Convert one layout dump and write its structured document.
///
/// # Example
///
/// ```no_run
/// use pdfchunk::{convert_file, ConvertConfig};
///
/// let config = ConvertConfig::default().with_toc_pages([2, 3]);
/// let doc = convert_file("steo.layout.json", "steo_structured.json", &config).unwrap();
/// println!("{} chunks", doc.chunks.len());
/// ```
pub fn convert_file<S, O>(source: S, output: O, config: &ConvertConfig) -> Result<StructuredDocument>
where
    S: AsRef<Path>,
    O: AsRef<Path>,
{
    let options = config.compile()?;
    Converter::new().convert_to_file(source.as_ref(), output.as_ref(), &options)
}

/// Convert in-memory runs without touching the filesystem.
///
/// # Example
///
/// ```
/// use pdfchunk::{convert_runs, ConvertOptions, GlyphRun};
///
/// let runs = vec![
///     GlyphRun::new(0, 18, "Overview"),
///     GlyphRun::new(0, 11, "Demand rises."),
///     GlyphRun::new(0, 11, "Supply follows."),
/// ];
/// let doc = convert_runs(runs, &ConvertOptions::new());
/// assert_eq!(doc.chunks.len(), 2);
/// assert_eq!(doc.chunks[1].text, "Demand rises. Supply follows.");
/// ```
pub fn convert_runs(runs: Vec<GlyphRun>, options: &ConvertOptions) -> StructuredDocument {
    Converter::new().convert_runs(runs, options)
}

/// Read a structured document from disk.
pub fn read_structured<P: AsRef<Path>>(path: P) -> Result<StructuredDocument> {
    StructuredDocument::from_file(path)
}

/// Classify and pair one structured document file.
///
/// Empty and placeholder documents yield no pairs.
pub fn pair_file<P: AsRef<Path>>(path: P, mode: PairingMode) -> Result<Vec<HeaderParagraphPair>> {
    let doc = StructuredDocument::from_file(path)?;
    Ok(pair_document(&doc, mode))
}

/// Assemble a corpus from directories of structured documents.
///
/// # Example
///
/// ```no_run
/// use pdfchunk::{build_corpus, CorpusOptions};
///
/// let corpus = build_corpus(["data/ieo", "data/aeo"], CorpusOptions::new()).unwrap();
/// println!("{} rows", corpus.rows.len());
/// ```
pub fn build_corpus<I, P>(dirs: I, options: CorpusOptions) -> Result<Corpus>
where
    I: IntoIterator<Item = P>,
    P: Into<std::path::PathBuf>,
{
    CorpusBuilder::new(dirs).with_options(options).build()
}
