//! Header/paragraph pairing over a classified chunk sequence.

use crate::model::{ClassifiedChunk, HeaderParagraphPair, Role};

/// How paragraphs that no heading captured are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingMode {
    /// Reproduce the established corpus output: a paragraph is only ever
    /// emitted as the `next` element of a pair, so a leading paragraph is
    /// dropped.
    #[default]
    Compatible,
    /// Also emit a leading paragraph as a header-less pair, so every chunk
    /// is emitted exactly once.
    KeepOrphans,
}

/// Walks `(el, next_el)` windows and emits pairs.
///
/// | el        | next_el   | emitted                         |
/// |-----------|-----------|---------------------------------|
/// | Heading   | Heading   | `(el, -)`                       |
/// | Heading   | Paragraph | `(el, next_el)`                 |
/// | Paragraph | Paragraph | `(-, next_el)`                  |
/// | Paragraph | Heading   | nothing                         |
/// | Heading   | (end)     | `(el, -)`                       |
/// | Paragraph | (end)     | nothing                         |
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderParagraphPairer {
    mode: PairingMode,
}

impl HeaderParagraphPairer {
    /// Create a pairer.
    pub fn new(mode: PairingMode) -> Self {
        Self { mode }
    }

    /// The pairing mode.
    pub fn mode(&self) -> PairingMode {
        self.mode
    }

    /// Emit pairs for a classified document.
    pub fn pair(&self, chunks: &[ClassifiedChunk<'_>]) -> Vec<HeaderParagraphPair> {
        let mut pairs = Vec::with_capacity(chunks.len());

        if self.mode == PairingMode::KeepOrphans {
            if let Some(first) = chunks.first().filter(|c| !c.is_heading()) {
                pairs.push(HeaderParagraphPair::paragraph_only(first.chunk));
            }
        }

        for (i, el) in chunks.iter().enumerate() {
            let Some(next) = chunks.get(i + 1) else {
                if el.is_heading() {
                    pairs.push(HeaderParagraphPair::header_only(el.chunk));
                }
                break;
            };

            match (el.role, next.role) {
                (Role::Heading, Role::Heading) => {
                    pairs.push(HeaderParagraphPair::header_only(el.chunk));
                }
                (Role::Heading, Role::Paragraph) => {
                    pairs.push(HeaderParagraphPair::pair(el.chunk, next.chunk));
                }
                (Role::Paragraph, Role::Paragraph) => {
                    pairs.push(HeaderParagraphPair::paragraph_only(next.chunk));
                }
                (Role::Paragraph, Role::Heading) => {}
            }
        }

        pairs
    }
}
