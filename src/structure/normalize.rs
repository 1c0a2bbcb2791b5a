//! Chunk text normalization.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::Chunk;

/// A per-collection text transform applied before normalization.
///
/// Filters are pure `&str -> String` functions and may reduce text to empty.
#[derive(Clone)]
pub struct TextFilter {
    name: String,
    func: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl TextFilter {
    /// Wrap a function as a named filter.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Filter name, for logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the filter.
    pub fn apply(&self, text: &str) -> String {
        (self.func)(text)
    }
}

impl fmt::Debug for TextFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextFilter").field("name", &self.name).finish()
    }
}

/// Built-in caption filters for known publishers.
///
/// Each one empties a chunk whose text starts with a table or figure caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFilter {
    /// Captions like "Figure 3." or "Table A2-1."
    Ieo,
    /// Captions like "Table 12." or "Figure MT-4."
    Aeo,
}

impl CaptionFilter {
    /// Caption pattern, anchored at the start of the chunk text.
    pub fn pattern(&self) -> &'static str {
        match self {
            CaptionFilter::Ieo => r"^(Table|Figure) [A-Z]?(\d+|\d+\-\d+)\.",
            CaptionFilter::Aeo => r"^(Table|Figure) ([A-Z]+)?([\d\-]+)\.",
        }
    }

    /// Build the text filter.
    pub fn to_filter(self) -> TextFilter {
        let re = Regex::new(self.pattern()).expect("caption pattern is valid");
        TextFilter::new(self.to_string(), move |text: &str| {
            if re.is_match(text) {
                String::new()
            } else {
                text.to_string()
            }
        })
    }
}

impl fmt::Display for CaptionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionFilter::Ieo => write!(f, "ieo"),
            CaptionFilter::Aeo => write!(f, "aeo"),
        }
    }
}

impl FromStr for CaptionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ieo" => Ok(CaptionFilter::Ieo),
            "aeo" => Ok(CaptionFilter::Aeo),
            _ => Err(Error::UnknownFilter(s.to_string())),
        }
    }
}

/// Cleans chunk text before it enters the body chunk list.
///
/// Steps, in order: custom filter, `(cid:N)` placeholders to a space,
/// hyphen + line break + whitespace to a space (the word halves are not
/// rejoined), non-breaking spaces to spaces, line breaks to spaces,
/// whitespace runs collapsed, ends trimmed.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    custom: Option<TextFilter>,
    cid_regex: Regex,
    hyphen_break_regex: Regex,
    whitespace_regex: Regex,
}

impl TextNormalizer {
    /// Create a normalizer without a custom filter.
    pub fn new() -> Self {
        Self {
            custom: None,
            cid_regex: Regex::new(r"\(cid:\d+\)").expect("valid regex"),
            hyphen_break_regex: Regex::new(r"-\n\s+").expect("valid regex"),
            whitespace_regex: Regex::new(r"\s\s+").expect("valid regex"),
        }
    }

    /// Set the custom filter applied first.
    pub fn with_filter(mut self, filter: Option<TextFilter>) -> Self {
        self.custom = filter;
        self
    }

    /// The custom filter, if any.
    pub fn filter(&self) -> Option<&TextFilter> {
        self.custom.as_ref()
    }

    /// Normalize a text.
    pub fn normalize_text(&self, text: &str) -> String {
        let filtered;
        let text = match &self.custom {
            Some(filter) => {
                filtered = filter.apply(text);
                filtered.as_str()
            }
            None => text,
        };

        let result = self.cid_regex.replace_all(text, " ");
        let result = self.hyphen_break_regex.replace_all(&result, " ");
        let result = result.replace('\u{a0}', " ").replace('\n', " ");
        let result = self.whitespace_regex.replace_all(&result, " ");
        result.trim().to_string()
    }

    /// Normalize a chunk, returning a new chunk. The input is left untouched.
    pub fn normalize(&self, chunk: &Chunk) -> Chunk {
        Chunk {
            page: chunk.page,
            size: chunk.size,
            text: self.normalize_text(&chunk.text),
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphen_break_inserts_space() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize_text("effici-\n   ency"), "effici ency");
    }

    #[test]
    fn test_hyphen_break_without_indent_keeps_hyphen() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize_text("effici-\nency"), "effici- ency");
    }

    #[test]
    fn test_cid_markers_removed() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize_text("a(cid:123)b (cid:7)"), "a b");
    }

    #[test]
    fn test_nbsp_newlines_and_whitespace() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.normalize_text("  one\u{a0}two\nthree \t  four\n"),
            "one two three four"
        );
    }

    #[test]
    fn test_empty_after_normalization() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize_text(" \n (cid:1) \u{a0}"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = TextNormalizer::new();
        let once = n.normalize_text("Intro  text-\n  more (cid:3)\u{a0}x\n\ny");
        assert_eq!(n.normalize_text(&once), once);
    }

    #[test]
    fn test_normalize_chunk_is_pure() {
        let n = TextNormalizer::new();
        let chunk = Chunk::new(2, 12, " a\nb ");
        let out = n.normalize(&chunk);
        assert_eq!(out, Chunk::new(2, 12, "a b"));
        assert_eq!(chunk.text, " a\nb ");
    }

    #[test]
    fn test_ieo_caption_filter() {
        let n = TextNormalizer::new().with_filter(Some(CaptionFilter::Ieo.to_filter()));
        assert_eq!(n.normalize_text("Figure 3. World energy use"), "");
        assert_eq!(n.normalize_text("Table A2-1. Supply"), "");
        assert_eq!(n.normalize_text("Table 12-3. Supply"), "");
        assert_eq!(n.normalize_text("See Figure 3. above"), "See Figure 3. above");
    }

    #[test]
    fn test_aeo_caption_filter() {
        let f = CaptionFilter::Aeo.to_filter();
        assert_eq!(f.apply("Figure MT-4. Prices"), "");
        assert_eq!(f.apply("Table 12. Prices"), "");
        assert_eq!(f.apply("Figures show"), "Figures show");
    }

    #[test]
    fn test_caption_filter_from_str() {
        assert_eq!("IEO".parse::<CaptionFilter>().unwrap(), CaptionFilter::Ieo);
        assert_eq!("aeo".parse::<CaptionFilter>().unwrap(), CaptionFilter::Aeo);
        assert!(matches!(
            "steo".parse::<CaptionFilter>(),
            Err(Error::UnknownFilter(_))
        ));
    }

    #[test]
    fn test_custom_closure_filter() {
        let f = TextFilter::new("upper", |t: &str| t.to_uppercase());
        let n = TextNormalizer::new().with_filter(Some(f));
        assert_eq!(n.normalize_text("a  b"), "A B");
        assert_eq!(n.filter().map(|f| f.name()), Some("upper"));
    }
}
