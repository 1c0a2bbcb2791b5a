//! Folding per-glyph layout lines into glyph runs.

use serde::{Deserialize, Serialize};

use crate::model::GlyphRun;

/// One positioned glyph or layout annotation.
///
/// Annotations (inserted spaces, line ends) carry no font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Decoded text of the glyph
    pub text: String,

    /// Font size in points, `None` for annotations
    #[serde(default)]
    pub size: Option<f64>,
}

impl Glyph {
    /// A sized character glyph.
    pub fn char(text: impl Into<String>, size: f64) -> Self {
        Self {
            text: text.into(),
            size: Some(size),
        }
    }

    /// A sizeless layout annotation.
    pub fn anno(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: None,
        }
    }
}

/// A visual text line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    /// Glyphs in reading order
    #[serde(default)]
    pub glyphs: Vec<Glyph>,
}

/// One page of layout lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    /// Page index; defaults to the page's position in the dump
    #[serde(default)]
    pub page: Option<u32>,

    /// Lines in reading order
    #[serde(default)]
    pub lines: Vec<LayoutLine>,
}

/// A full page/line/glyph dump of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDump {
    /// Pages in document order
    pub pages: Vec<LayoutPage>,
}

impl LayoutDump {
    /// Fold every line of every page into runs.
    pub fn into_runs(self) -> Vec<GlyphRun> {
        let mut builder = RunBuilder::new();
        for (index, page) in self.pages.iter().enumerate() {
            let page_num = page.page.unwrap_or(index as u32);
            for line in &page.lines {
                builder.push_line(page_num, &line.glyphs);
            }
        }
        builder.finish()
    }
}

/// Round a font size the way the layout device does (ties to even).
pub fn round_size(size: f64) -> u32 {
    size.round_ties_even().max(0.0) as u32
}

/// Collapse internal whitespace runs to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A run being accumulated within one line.
struct PendingRun {
    size: Option<u32>,
    text: String,
}

/// Builds glyph runs line by line.
///
/// Within a line a new run starts whenever the rounded size changes. A run
/// closed by a size change is whitespace-collapsed; the last run of a line
/// is kept raw so line-end annotations reach the normalizer.
#[derive(Debug, Default)]
pub struct RunBuilder {
    runs: Vec<GlyphRun>,
}

impl RunBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one visual line into runs.
    pub fn push_line(&mut self, page: u32, glyphs: &[Glyph]) {
        let mut pending: Option<PendingRun> = None;

        for glyph in glyphs {
            match (glyph.size.map(round_size), pending.as_mut()) {
                (
                    Some(size),
                    Some(PendingRun {
                        size: Some(current),
                        text,
                    }),
                ) => {
                    if *current == size {
                        text.push_str(&glyph.text);
                    } else {
                        if !text.is_empty() {
                            self.runs
                                .push(GlyphRun::new(page, *current, collapse_whitespace(text)));
                        }
                        pending = Some(PendingRun {
                            size: Some(size),
                            text: glyph.text.clone(),
                        });
                    }
                }
                // First sized glyph: earlier annotation text is dropped.
                (Some(size), _) => {
                    pending = Some(PendingRun {
                        size: Some(size),
                        text: glyph.text.clone(),
                    });
                }
                (None, Some(run)) => run.text.push_str(&glyph.text),
                (None, None) => {
                    pending = Some(PendingRun {
                        size: None,
                        text: glyph.text.clone(),
                    });
                }
            }
        }

        if let Some(run) = pending {
            if let Some(size) = run.size {
                self.runs.push(GlyphRun::new(page, size, run.text));
            }
        }
    }

    /// Number of runs built so far.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Check if no runs were built.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Consume the builder and return the runs in order.
    pub fn finish(self) -> Vec<GlyphRun> {
        self.runs
    }
}
