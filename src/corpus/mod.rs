//! Pairing stage: turn structured documents into header/paragraph rows.
//!
//! Each document is classified on its own: the font size covering the most
//! characters is body text, anything larger is a heading. The classified
//! sequence is then walked pairwise to attach paragraphs to the heading
//! before them.

mod assemble;
mod classify;
mod pairing;

pub use assemble::{Corpus, CorpusBuilder, CorpusOptions, YearMap, DEFAULT_ORGANISATION};
pub use classify::FontSizeClassifier;
pub use pairing::{HeaderParagraphPairer, PairingMode};

use crate::model::{HeaderParagraphPair, StructuredDocument};

/// Classify and pair one document. Empty documents yield no pairs.
pub fn pair_document(doc: &StructuredDocument, mode: PairingMode) -> Vec<HeaderParagraphPair> {
    match FontSizeClassifier::from_document(doc) {
        Some(classifier) => {
            HeaderParagraphPairer::new(mode).pair(&classifier.classify(&doc.chunks))
        }
        None => Vec::new(),
    }
}
