//! Types produced by the pairing stage.

use serde::{Deserialize, Serialize};

use super::Chunk;

/// Structural role of a chunk relative to its document's dominant size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Larger than the dominant size
    Heading,
    /// At or below the dominant size
    Paragraph,
}

/// A chunk with its derived role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedChunk<'a> {
    /// The underlying chunk
    pub chunk: &'a Chunk,

    /// Derived role
    pub role: Role,
}

impl ClassifiedChunk<'_> {
    /// Check if this chunk is a heading.
    pub fn is_heading(&self) -> bool {
        self.role == Role::Heading
    }
}

/// One header/paragraph pair emitted by the pairing walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderParagraphPair {
    /// Heading text, if any
    pub header: Option<String>,

    /// Paragraph text, if any
    pub paragraph: Option<String>,

    /// Heading font size
    pub header_size: Option<u32>,

    /// Paragraph font size
    pub paragraph_size: Option<u32>,

    /// Start page of the pair
    pub page: u32,
}

impl HeaderParagraphPair {
    /// A heading with no paragraph.
    pub fn header_only(header: &Chunk) -> Self {
        Self {
            header: Some(header.text.clone()),
            paragraph: None,
            header_size: Some(header.size),
            paragraph_size: None,
            page: header.page,
        }
    }

    /// A heading followed by its paragraph.
    pub fn pair(header: &Chunk, paragraph: &Chunk) -> Self {
        Self {
            header: Some(header.text.clone()),
            paragraph: Some(paragraph.text.clone()),
            header_size: Some(header.size),
            paragraph_size: Some(paragraph.size),
            page: header.page,
        }
    }

    /// A paragraph with no heading.
    pub fn paragraph_only(paragraph: &Chunk) -> Self {
        Self {
            header: None,
            paragraph: Some(paragraph.text.clone()),
            header_size: None,
            paragraph_size: Some(paragraph.size),
            page: paragraph.page,
        }
    }
}

/// Where a document came from, derived from its path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Publishing organisation
    pub organisation: String,

    /// Document category (first directory under the corpus root)
    pub doc_category: String,

    /// File name of the structured document
    pub filename: String,
}

/// One row of the assembled corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRow {
    /// Publishing organisation
    pub organisation: String,

    /// Document category
    pub doc_category: String,

    /// Structured document file name
    pub filename: String,

    /// Heading text
    pub header_text: Option<String>,

    /// Paragraph text
    pub para_text: Option<String>,

    /// Heading font size
    pub header_size: Option<u32>,

    /// Paragraph font size
    pub para_size: Option<u32>,

    /// Start page of the pair
    pub start_page: u32,

    /// Publication year, when a year map was supplied
    pub year: Option<i32>,
}

impl CorpusRow {
    /// Build a row from a pair and its document's source info.
    pub fn new(source: &SourceInfo, pair: HeaderParagraphPair) -> Self {
        Self {
            organisation: source.organisation.clone(),
            doc_category: source.doc_category.clone(),
            filename: source.filename.clone(),
            header_text: pair.header,
            para_text: pair.paragraph,
            header_size: pair.header_size,
            para_size: pair.paragraph_size,
            start_page: pair.page,
            year: None,
        }
    }
}
