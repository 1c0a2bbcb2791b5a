//! On-disk conversion configuration.
//!
//! Config files are JSON objects using these keys:
//!
//! ```json
//! {
//!   "exclusions_page": [1, 2, 111, 128, -1],
//!   "exclusions_exact": ["Source:", "\\d+$"],
//!   "inclusions_font": [10, 12],
//!   "table_of_contents": [3, 4],
//!   "to_filter": true,
//!   "laparams": {"line_margin": 0.5}
//! }
//! ```
//!
//! Any other keys are kept and handed to the layout provider untouched.
//! Collection defaults and per-document overrides merge key by key.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::convert::ConvertOptions;
use crate::error::{Error, Result};
use crate::layout::LayoutParams;
use crate::structure::LineFilter;

/// Raw conversion configuration for one document or collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Excluded pages, optionally ending a range with `-1`
    #[serde(default)]
    pub exclusions_page: Vec<i64>,

    /// Patterns dropping runs whose text starts with a match
    #[serde(default)]
    pub exclusions_exact: Vec<String>,

    /// Allowlisted font sizes
    #[serde(default)]
    pub inclusions_font: Vec<u32>,

    /// Table-of-contents pages
    #[serde(default)]
    pub table_of_contents: Vec<u32>,

    /// Whether the line filter runs at all
    #[serde(default)]
    pub to_filter: bool,

    /// Layout provider parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laparams: Option<LayoutParams>,

    /// Unrecognized keys, passed through
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConvertConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a config file as a raw JSON object.
    pub fn read_object<P: AsRef<Path>>(path: P) -> Result<Map<String, Value>> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        match serde_json::from_str::<Value>(&json)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Other(format!(
                "{}: expected a JSON object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    /// Load a config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_object(Self::read_object(path)?)
    }

    /// Build from a raw JSON object.
    pub fn from_object(map: Map<String, Value>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Layer `overrides` on top of `defaults`; keys in `overrides` win.
    pub fn merged(defaults: &Map<String, Value>, overrides: Map<String, Value>) -> Result<Self> {
        let mut map = defaults.clone();
        map.extend(overrides);
        Self::from_object(map)
    }

    /// Set the table-of-contents pages.
    pub fn with_toc_pages(mut self, pages: impl IntoIterator<Item = u32>) -> Self {
        self.table_of_contents = pages.into_iter().collect();
        self
    }

    /// Enable or disable the line filter.
    pub fn with_filtering(mut self, enabled: bool) -> Self {
        self.to_filter = enabled;
        self
    }

    /// Set the page exclusion list.
    pub fn with_page_exclusions(mut self, pages: impl IntoIterator<Item = i64>) -> Self {
        self.exclusions_page = pages.into_iter().collect();
        self
    }

    /// Set the text exclusion patterns.
    pub fn with_text_exclusions<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.exclusions_exact = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the allowlisted font sizes.
    pub fn with_font_sizes(mut self, sizes: impl IntoIterator<Item = u32>) -> Self {
        self.inclusions_font = sizes.into_iter().collect();
        self
    }

    /// Layout parameters for the provider.
    pub fn layout_params(&self) -> LayoutParams {
        self.laparams.clone().unwrap_or_default()
    }

    /// Validate and compile into immutable conversion options.
    ///
    /// Page-range and pattern errors are fatal and are reported even when
    /// filtering is disabled.
    pub fn compile(&self) -> Result<ConvertOptions> {
        let filter = LineFilter::new(
            &self.exclusions_page,
            &self.exclusions_exact,
            &self.inclusions_font,
        )?;

        Ok(ConvertOptions::new()
            .with_line_filter(self.to_filter.then_some(filter))
            .with_toc_pages(self.table_of_contents.iter().copied())
            .with_layout_params(self.layout_params()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
