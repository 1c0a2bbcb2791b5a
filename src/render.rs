//! JSON rendering for structured documents and corpora.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

impl JsonFormat {
    /// Pick compact or pretty output from a flag.
    pub fn from_compact(compact: bool) -> Self {
        if compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        }
    }
}

/// Serialize a value to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Other(format!("JSON serialization error: {}", e)))
}

/// Serialize a value and write it to `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, format: JsonFormat) -> Result<()> {
    let json = to_json(value, format)?;
    fs::write(path, json)?;
    Ok(())
}
