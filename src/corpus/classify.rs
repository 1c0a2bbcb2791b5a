//! Heading detection by font size.

use std::collections::HashMap;

use crate::model::{Chunk, ClassifiedChunk, Role, StructuredDocument};

/// Per-document font statistics and the heading threshold they imply.
///
/// The dominant size is the size covering the most characters across all
/// chunks; ties go to the size seen first. Chunks strictly larger than it
/// are headings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSizeClassifier {
    dominant_size: u32,
    histogram: Vec<(u32, usize)>,
}

impl FontSizeClassifier {
    /// Build from a chunk list. Returns `None` when there is nothing to
    /// classify.
    pub fn from_chunks(chunks: &[Chunk]) -> Option<Self> {
        let mut histogram: Vec<(u32, usize)> = Vec::new();
        let mut index: HashMap<u32, usize> = HashMap::new();

        for chunk in chunks {
            let slot = *index.entry(chunk.size).or_insert_with(|| {
                histogram.push((chunk.size, 0));
                histogram.len() - 1
            });
            histogram[slot].1 += chunk.char_count();
        }

        let mut best: Option<(u32, usize)> = None;
        for &(size, count) in &histogram {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((size, count));
            }
        }

        best.map(|(dominant_size, _)| Self {
            dominant_size,
            histogram,
        })
    }

    /// Build from a structured document, skipping empty and placeholder
    /// documents.
    pub fn from_document(doc: &StructuredDocument) -> Option<Self> {
        if doc.is_empty() {
            return None;
        }
        Self::from_chunks(&doc.chunks)
    }

    /// The body text size.
    pub fn dominant_size(&self) -> u32 {
        self.dominant_size
    }

    /// Character count per size, in first-seen order.
    pub fn histogram(&self) -> &[(u32, usize)] {
        &self.histogram
    }

    /// Role of a chunk of the given size.
    pub fn role(&self, size: u32) -> Role {
        if size > self.dominant_size {
            Role::Heading
        } else {
            Role::Paragraph
        }
    }

    /// Classify every chunk.
    pub fn classify<'a>(&self, chunks: &'a [Chunk]) -> Vec<ClassifiedChunk<'a>> {
        chunks
            .iter()
            .map(|chunk| ClassifiedChunk {
                chunk,
                role: self.role(chunk.size),
            })
            .collect()
    }
}
