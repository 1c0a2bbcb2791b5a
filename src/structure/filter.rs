//! Pre-merge run filtering by page, text pattern and font size.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::GlyphRun;

/// Marker in an `exclusions_page` list closing an inclusive range.
pub const RANGE_SENTINEL: i64 = -1;

/// Runs at or above this size are kept even when not allowlisted.
pub const HEADING_OVERRIDE_SIZE: u32 = 18;

/// Page exclusions parsed from an `exclusions_page` list.
///
/// Every listed value is excluded as a single page. If the list contains the
/// `-1` sentinel, the two values before its first occurrence also bound an
/// inclusive excluded range, so `[10, 20, -1]` excludes pages 10 to 20.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExclusions {
    pages: HashSet<i64>,
    range: Option<RangeInclusive<i64>>,
}

impl PageExclusions {
    /// Parse an exclusion list.
    ///
    /// Fails when the sentinel sits in the first or second position, since a
    /// range needs both bounds before it.
    pub fn parse(values: &[i64]) -> Result<Self> {
        let range = match values.iter().position(|v| *v == RANGE_SENTINEL) {
            Some(idx) if idx < 2 => {
                return Err(Error::InvalidPageRange(format!(
                    "-1 at position {} of {:?}; it must follow the min and max page, \
                     e.g. [111, 128, -1] excludes pages 111 to 128",
                    idx, values
                )));
            }
            Some(idx) => Some(values[idx - 2]..=values[idx - 1]),
            None => None,
        };

        Ok(Self {
            pages: values.iter().copied().collect(),
            range,
        })
    }

    /// Check if a page is excluded.
    pub fn excludes(&self, page: u32) -> bool {
        let page = i64::from(page);
        self.pages.contains(&page) || self.range.as_ref().is_some_and(|r| r.contains(&page))
    }

    /// The excluded range, if one was configured.
    pub fn range(&self) -> Option<&RangeInclusive<i64>> {
        self.range.as_ref()
    }
}

/// Why a run was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Page listed in `exclusions_page`
    Page,
    /// Page inside the configured range
    PageRange,
    /// Text matched an exclusion pattern
    Pattern,
    /// Font size neither allowlisted nor large enough
    FontSize,
}

/// Drops runs by page, text pattern and font size, preserving order.
#[derive(Debug, Clone, Default)]
pub struct LineFilter {
    pages: PageExclusions,
    patterns: Vec<Regex>,
    allowed_sizes: HashSet<u32>,
}

impl LineFilter {
    /// Build a filter, compiling patterns anchored at the start of the text.
    pub fn new(
        exclusions_page: &[i64],
        exclusions_exact: &[String],
        inclusions_font: &[u32],
    ) -> Result<Self> {
        let pages = PageExclusions::parse(exclusions_page)?;
        let patterns = exclusions_exact
            .iter()
            .map(|p| Regex::new(&format!("^(?:{})", p)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            pages,
            patterns,
            allowed_sizes: inclusions_font.iter().copied().collect(),
        })
    }

    /// Decide whether a run is dropped, and why. First matching rule wins.
    pub fn check(&self, run: &GlyphRun) -> Option<Exclusion> {
        let page = i64::from(run.page);
        if self.pages.pages.contains(&page) {
            return Some(Exclusion::Page);
        }
        if self.pages.range.as_ref().is_some_and(|r| r.contains(&page)) {
            return Some(Exclusion::PageRange);
        }
        // `$` also matches before a single trailing newline, which line-final
        // runs keep.
        let chomped = run.text.strip_suffix('\n');
        if self
            .patterns
            .iter()
            .any(|re| re.is_match(&run.text) || chomped.is_some_and(|t| re.is_match(t)))
        {
            return Some(Exclusion::Pattern);
        }
        if !self.allowed_sizes.contains(&run.size) && run.size < HEADING_OVERRIDE_SIZE {
            return Some(Exclusion::FontSize);
        }
        None
    }

    /// Check if a run survives the filter.
    pub fn keeps(&self, run: &GlyphRun) -> bool {
        self.check(run).is_none()
    }

    /// Filter a run sequence, preserving order.
    pub fn apply(&self, runs: Vec<GlyphRun>) -> Vec<GlyphRun> {
        let before = runs.len();
        let kept: Vec<GlyphRun> = runs.into_iter().filter(|r| self.keeps(r)).collect();
        log::debug!("line filter kept {} of {} runs", kept.len(), before);
        kept
    }

    /// Page exclusions in effect.
    pub fn page_exclusions(&self) -> &PageExclusions {
        &self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pages: &[i64], patterns: &[&str], sizes: &[u32]) -> LineFilter {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        LineFilter::new(pages, &patterns, sizes).unwrap()
    }

    #[test]
    fn test_page_range_sentinel() {
        let ex = PageExclusions::parse(&[10, 20, -1]).unwrap();
        assert!(ex.excludes(10));
        assert!(ex.excludes(15));
        assert!(ex.excludes(20));
        assert!(!ex.excludes(9));
        assert!(!ex.excludes(21));
    }

    #[test]
    fn test_sentinel_in_first_positions_is_fatal() {
        for values in [vec![-1, 20], vec![10, -1], vec![-1]] {
            let err = PageExclusions::parse(&values).unwrap_err();
            assert!(matches!(err, Error::InvalidPageRange(_)));
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn test_single_pages_and_range_combined() {
        let ex = PageExclusions::parse(&[3, 40, 50, -1]).unwrap();
        assert!(ex.excludes(3));
        assert!(ex.excludes(45));
        assert!(!ex.excludes(4));
        assert_eq!(ex.range(), Some(&(40..=50)));
    }

    #[test]
    fn test_font_size_allowlist_with_override() {
        let f = filter(&[], &[], &[12]);
        assert_eq!(f.check(&GlyphRun::new(0, 10, "small")), Some(Exclusion::FontSize));
        assert!(f.keeps(&GlyphRun::new(0, 24, "Big heading")));
        assert!(f.keeps(&GlyphRun::new(0, 18, "Exactly 18")));
        assert!(f.keeps(&GlyphRun::new(0, 12, "body")));
    }

    #[test]
    fn test_patterns_anchor_at_start() {
        let f = filter(&[], &["Source:", "\\d+$"], &[12]);
        assert_eq!(
            f.check(&GlyphRun::new(0, 12, "Source: EIA")),
            Some(Exclusion::Pattern)
        );
        assert!(f.keeps(&GlyphRun::new(0, 12, "See Source: EIA")));
        assert_eq!(f.check(&GlyphRun::new(0, 12, "42")), Some(Exclusion::Pattern));
    }

    #[test]
    fn test_end_anchor_ignores_trailing_newline() {
        let f = filter(&[], &["\\d+$"], &[12]);
        assert_eq!(f.check(&GlyphRun::new(0, 12, "42\n")), Some(Exclusion::Pattern));
        assert!(f.keeps(&GlyphRun::new(0, 12, "42\n\n")));
        assert!(f.keeps(&GlyphRun::new(0, 12, "42 tonnes\n")));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let f = filter(&[], &["a|b"], &[12]);
        assert!(f.keeps(&GlyphRun::new(0, 12, "xb")));
        assert!(!f.keeps(&GlyphRun::new(0, 12, "b")));
    }

    #[test]
    fn test_page_rules_come_first() {
        let f = filter(&[2, 5, 7, -1], &["x"], &[12]);
        assert_eq!(f.check(&GlyphRun::new(2, 30, "x")), Some(Exclusion::Page));
        assert_eq!(f.check(&GlyphRun::new(6, 30, "x")), Some(Exclusion::PageRange));
    }

    #[test]
    fn test_apply_preserves_order() {
        let f = filter(&[1], &[], &[12]);
        let runs = vec![
            GlyphRun::new(0, 12, "a"),
            GlyphRun::new(1, 12, "b"),
            GlyphRun::new(2, 12, "c"),
        ];
        let kept: Vec<String> = f.apply(runs).into_iter().map(|r| r.text).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn test_bad_pattern_is_fatal() {
        let err = LineFilter::new(&[], &["(".to_string()], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern(_)));
        assert!(err.is_fatal());
    }
}
