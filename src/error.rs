//! Error types for pdfchunk library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfchunk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting or pairing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON in a layout dump, config or structured document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The `-1` range sentinel in `exclusions_page` is misplaced.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// A text exclusion pattern failed to compile.
    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A required input or output path was not supplied.
    #[error("Missing path: {0}")]
    MissingPath(String),

    /// The structured document has no usable chunks.
    #[error("Document has no chunks: {0}")]
    EmptyDocument(String),

    /// Unknown custom text filter name.
    #[error("Unknown text filter: {0}")]
    UnknownFilter(String),

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// The batch was cancelled before it completed.
    #[error("Batch cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error must abort the whole run rather than one document.
    ///
    /// Only configuration validation errors are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidPageRange(_) | Error::InvalidPattern(_) | Error::UnknownFilter(_)
        )
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(err.to_string())
    }
}
