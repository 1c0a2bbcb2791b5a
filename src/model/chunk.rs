//! Chunks and the structured document persisted per source file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::GlyphRun;
use crate::error::Result;

/// A maximal run sequence sharing one font size.
///
/// `page` is the page of the first run folded in; later runs on later pages
/// do not move it. Missing fields deserialize to their defaults so that the
/// `{}` placeholder written for empty documents still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Page of the first run
    #[serde(default)]
    pub page: u32,

    /// Rounded font size shared by all runs
    #[serde(default)]
    pub size: u32,

    /// Space-joined run texts
    #[serde(default)]
    pub text: String,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(page: u32, size: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            size,
            text: text.into(),
        }
    }

    /// Append another run's text, joined with a single space.
    pub fn push_text(&mut self, text: &str) {
        self.text.push(' ');
        self.text.push_str(text);
    }

    /// Number of characters (not bytes) of text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if this is the empty placeholder chunk.
    pub fn is_placeholder(&self) -> bool {
        self.text.is_empty() && self.size == 0
    }
}

impl From<GlyphRun> for Chunk {
    fn from(run: GlyphRun) -> Self {
        Self {
            page: run.page,
            size: run.size,
            text: run.text,
        }
    }
}

/// A chunk routed to the table of contents.
pub type TocEntry = Chunk;

/// The persisted result of converting one source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDocument {
    /// Normalized body chunks in reading order
    #[serde(rename = "doc", default)]
    pub chunks: Vec<Chunk>,

    /// Raw snapshots of chunks found on table-of-contents pages
    #[serde(rename = "table_of_contents", default)]
    pub toc: Vec<TocEntry>,
}

impl StructuredDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a structured document written by the conversion stage.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check if the document has no usable body chunks.
    ///
    /// A document whose only chunk is the `{}` placeholder counts as empty.
    pub fn is_empty(&self) -> bool {
        match self.chunks.as_slice() {
            [] => true,
            [only] => only.is_placeholder(),
            _ => false,
        }
    }

    /// Plain text of all body chunks, one per line.
    pub fn plain_text(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
