//! Layout provider seam.
//!
//! Byte-level PDF parsing and glyph decoding happen outside this crate. A
//! provider hands back the document's glyph runs in reading order.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::LayoutDump;
use crate::error::Result;
use crate::model::GlyphRun;

/// Free-form layout parameters, passed through to the provider unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutParams(pub Map<String, Value>);

impl LayoutParams {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a parameter.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Check if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Source of glyph runs for one document.
pub trait LayoutProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Produce the runs of the document at `source`, in reading order.
    fn runs(&self, source: &Path, params: &LayoutParams) -> Result<Vec<GlyphRun>>;
}

/// The two on-disk shapes a layout dump may take.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DumpFile {
    Runs(Vec<GlyphRun>),
    Pages(LayoutDump),
}

/// Reads layout dumps written as JSON.
///
/// Accepts either a flat array of `{page, size, text}` runs or a
/// `{"pages": [{"lines": [{"glyphs": [...]}]}]}` tree.
#[derive(Debug, Clone, Default)]
pub struct JsonLayoutProvider {
    _private: (),
}

impl JsonLayoutProvider {
    /// Create a new JSON layout provider.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Parse a dump from a string.
    pub fn parse_str(&self, json: &str) -> Result<Vec<GlyphRun>> {
        let runs = match serde_json::from_str::<DumpFile>(json)? {
            DumpFile::Runs(runs) => runs,
            DumpFile::Pages(dump) => dump.into_runs(),
        };
        Ok(runs)
    }
}

impl LayoutProvider for JsonLayoutProvider {
    fn name(&self) -> &str {
        "json"
    }

    fn runs(&self, source: &Path, params: &LayoutParams) -> Result<Vec<GlyphRun>> {
        if !params.is_empty() {
            log::debug!(
                "{}: layout params {:?} are fixed by the dump, ignoring",
                source.display(),
                params.0.keys().collect::<Vec<_>>()
            );
        }
        let json = fs::read_to_string(source)?;
        self.parse_str(&json)
    }
}
