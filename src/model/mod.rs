//! Data model shared by the conversion and pairing stages.
//!
//! Runs and chunks live only for one document's conversion pass. The
//! structured document is written once per source file and read back,
//! unchanged, by the pairing stage.

mod chunk;
mod corpus;
mod run;

pub use chunk::{Chunk, StructuredDocument, TocEntry};
pub use corpus::{ClassifiedChunk, CorpusRow, HeaderParagraphPair, Role, SourceInfo};
pub use run::GlyphRun;
