//! Folding runs into size-homogeneous chunks, with table-of-contents split.

use std::collections::BTreeSet;

use super::TextNormalizer;
use crate::model::{Chunk, GlyphRun, StructuredDocument};

/// Folds a run sequence into chunks.
///
/// A font size change closes the current chunk; a page change does not, so
/// paragraphs wrapping across a page break stay together. Chunks whose page
/// is a table-of-contents page are also reported in the TOC list.
///
/// TOC entries are frozen copies of the raw accumulator taken when they are
/// appended. A TOC chunk that continues across a page break is therefore
/// reported once per page change and again when it completes.
#[derive(Debug)]
pub struct ChunkMerger<'a> {
    toc_pages: &'a BTreeSet<u32>,
    normalizer: &'a TextNormalizer,
    current: Option<Chunk>,
    chunks: Vec<Chunk>,
    toc: Vec<Chunk>,
}

impl<'a> ChunkMerger<'a> {
    /// Create a merger for one document.
    pub fn new(toc_pages: &'a BTreeSet<u32>, normalizer: &'a TextNormalizer) -> Self {
        Self {
            toc_pages,
            normalizer,
            current: None,
            chunks: Vec::new(),
            toc: Vec::new(),
        }
    }

    fn is_toc(&self, chunk: &Chunk) -> bool {
        self.toc_pages.contains(&chunk.page)
    }

    /// Feed the next run.
    pub fn push(&mut self, run: GlyphRun) {
        let Some(current) = self.current.as_mut().filter(|c| !c.text.is_empty()) else {
            self.current = Some(run.into());
            return;
        };

        if run.size != current.size {
            let done = std::mem::replace(current, run.into());
            self.emit_body(&done);
            if self.is_toc(&done) {
                self.toc.push(done);
            }
        } else if run.page != current.page {
            if self.toc_pages.contains(&current.page) {
                self.toc.push(current.clone());
            }
            current.push_text(&run.text);
        } else {
            current.push_text(&run.text);
        }
    }

    /// Feed every run of an iterator.
    pub fn extend<I: IntoIterator<Item = GlyphRun>>(&mut self, runs: I) {
        for run in runs {
            self.push(run);
        }
    }

    fn emit_body(&mut self, chunk: &Chunk) {
        let normalized = self.normalizer.normalize(chunk);
        if !normalized.text.is_empty() {
            self.chunks.push(normalized);
        }
    }

    /// Flush the final chunk and return the structured document.
    ///
    /// Only this last flush treats the TOC and body lists as exclusive.
    pub fn finish(mut self) -> StructuredDocument {
        if let Some(last) = self.current.take() {
            if self.is_toc(&last) {
                self.toc.push(last);
            } else {
                self.emit_body(&last);
            }
        }

        log::debug!(
            "merged into {} chunks and {} toc entries",
            self.chunks.len(),
            self.toc.len()
        );

        StructuredDocument {
            chunks: self.chunks,
            toc: self.toc,
        }
    }
}

/// Merge a run sequence in one call.
pub fn merge_runs<I>(
    runs: I,
    toc_pages: &BTreeSet<u32>,
    normalizer: &TextNormalizer,
) -> StructuredDocument
where
    I: IntoIterator<Item = GlyphRun>,
{
    let mut merger = ChunkMerger::new(toc_pages, normalizer);
    merger.extend(runs);
    merger.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(items: &[(u32, u32, &str)]) -> Vec<GlyphRun> {
        items.iter().map(|&r| r.into()).collect()
    }

    fn merge(items: &[(u32, u32, &str)], toc: &[u32]) -> StructuredDocument {
        let toc: BTreeSet<u32> = toc.iter().copied().collect();
        merge_runs(runs(items), &toc, &TextNormalizer::new())
    }

    #[test]
    fn test_size_change_closes_chunk() {
        let doc = merge(&[(1, 12, "Intro"), (1, 12, " text"), (2, 20, "Chapter 1")], &[]);
        assert_eq!(
            doc.chunks,
            vec![Chunk::new(1, 12, "Intro text"), Chunk::new(2, 20, "Chapter 1")]
        );
        assert!(doc.toc.is_empty());
    }

    #[test]
    fn test_page_change_does_not_split() {
        let doc = merge(&[(1, 12, "wraps across"), (2, 12, "the break"), (2, 18, "H")], &[]);
        assert_eq!(doc.chunks[0], Chunk::new(1, 12, "wraps across the break"));
        assert_eq!(doc.chunks.len(), 2);
    }

    #[test]
    fn test_empty_normalized_chunk_dropped() {
        let doc = merge(&[(0, 12, "(cid:5)"), (0, 14, "Real")], &[]);
        assert_eq!(doc.chunks, vec![Chunk::new(0, 14, "Real")]);
    }

    #[test]
    fn test_empty_current_is_replaced() {
        let doc = merge(&[(0, 30, ""), (0, 12, "body")], &[]);
        assert_eq!(doc.chunks, vec![Chunk::new(0, 12, "body")]);
    }

    #[test]
    fn test_toc_chunk_goes_to_both_lists_on_boundary() {
        let doc = merge(&[(0, 12, "1. Intro ..... 3"), (1, 20, "Chapter")], &[0]);
        assert_eq!(doc.toc, vec![Chunk::new(0, 12, "1. Intro ..... 3")]);
        assert_eq!(
            doc.chunks,
            vec![Chunk::new(0, 12, "1. Intro ..... 3"), Chunk::new(1, 20, "Chapter")]
        );
    }

    #[test]
    fn test_final_toc_chunk_only_in_toc() {
        let doc = merge(&[(0, 20, "Contents"), (0, 12, "1. Intro")], &[0]);
        assert_eq!(doc.chunks, vec![Chunk::new(0, 20, "Contents")]);
        assert_eq!(
            doc.toc,
            vec![Chunk::new(0, 20, "Contents"), Chunk::new(0, 12, "1. Intro")]
        );
    }

    #[test]
    fn test_toc_snapshot_is_frozen() {
        // Same size across pages 0 -> 1 -> 2 with page 0 a TOC page.
        let doc = merge(
            &[(0, 12, "a"), (1, 12, "b"), (2, 12, "c"), (2, 20, "H")],
            &[0],
        );
        assert_eq!(
            doc.toc,
            vec![
                Chunk::new(0, 12, "a"),
                Chunk::new(0, 12, "a b"),
                Chunk::new(0, 12, "a b c"),
            ]
        );
        assert_eq!(doc.chunks[0], Chunk::new(0, 12, "a b c"));
    }

    #[test]
    fn test_toc_entries_keep_raw_text() {
        let doc = merge(&[(0, 12, "Intro\n"), (0, 12, "  3"), (0, 20, "H")], &[0]);
        assert_eq!(doc.toc[0].text, "Intro\n   3");
        assert_eq!(doc.chunks[0].text, "Intro 3");
    }

    #[test]
    fn test_empty_input() {
        let doc = merge(&[], &[1]);
        assert!(doc.chunks.is_empty());
        assert!(doc.toc.is_empty());
    }

    #[test]
    fn test_merge_is_deterministic() {
        let input = [(0, 12, "a"), (1, 12, "b"), (1, 14, "c"), (2, 14, "d"), (3, 9, "e")];
        assert_eq!(merge(&input, &[1, 2]), merge(&input, &[1, 2]));
    }
}
