//! Corpus assembly: structured documents in, header/paragraph rows out.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use serde_json::Value;

use super::{FontSizeClassifier, HeaderParagraphPairer, PairingMode};
use crate::convert::batch::{default_workers, STRUCTURED_SUFFIX};
use crate::error::{Error, Result};
use crate::model::{CorpusRow, SourceInfo, StructuredDocument};

/// Organisation recorded when none is configured.
pub const DEFAULT_ORGANISATION: &str = "EIA";

/// Publication years keyed by structured document file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearMap(HashMap<String, i32>);

impl YearMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `{"<filename>": year}` JSON object. Years may be integers or
    /// numeric strings.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a year map from JSON text.
    pub fn parse_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(map) = value else {
            return Err(Error::Other("year map must be a JSON object".into()));
        };

        let mut years = HashMap::with_capacity(map.len());
        for (filename, year) in map {
            let parsed = match &year {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                    .and_then(|y| i32::try_from(y).ok()),
                Value::String(s) => s.trim().parse::<i32>().ok(),
                _ => None,
            };
            match parsed {
                Some(y) => {
                    years.insert(filename, y);
                }
                None => {
                    return Err(Error::Other(format!(
                        "invalid year for {}: {}",
                        filename, year
                    )))
                }
            }
        }
        Ok(Self(years))
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, filename: impl Into<String>, year: i32) {
        self.0.insert(filename.into(), year);
    }

    /// Year for a file name.
    pub fn get(&self, filename: &str) -> Option<i32> {
        self.0.get(filename).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Options for corpus assembly.
#[derive(Debug, Clone)]
pub struct CorpusOptions {
    /// Organisation recorded on every row
    pub organisation: String,

    /// Treatment of leading paragraphs
    pub pairing_mode: PairingMode,

    /// Drop rows that carry no paragraph text
    pub drop_empty_paragraphs: bool,

    /// Optional publication years
    pub year_map: Option<YearMap>,

    /// Worker count (0 means all cores but one)
    pub workers: usize,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            organisation: DEFAULT_ORGANISATION.to_string(),
            pairing_mode: PairingMode::default(),
            drop_empty_paragraphs: false,
            year_map: None,
            workers: 0,
        }
    }
}

impl CorpusOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the organisation.
    pub fn with_organisation(mut self, organisation: impl Into<String>) -> Self {
        self.organisation = organisation.into();
        self
    }

    /// Set the pairing mode.
    pub fn with_pairing_mode(mut self, mode: PairingMode) -> Self {
        self.pairing_mode = mode;
        self
    }

    /// Drop rows without paragraph text.
    pub fn with_drop_empty_paragraphs(mut self, enabled: bool) -> Self {
        self.drop_empty_paragraphs = enabled;
        self
    }

    /// Annotate rows with publication years.
    pub fn with_year_map(mut self, years: YearMap) -> Self {
        self.year_map = Some(years);
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Outcome of pairing one structured document.
#[derive(Debug)]
enum DocumentRows {
    Rows(Vec<CorpusRow>),
    Skipped,
    Failed,
}

/// The assembled corpus and its bookkeeping.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Corpus {
    /// Rows in document discovery order
    pub rows: Vec<CorpusRow>,

    /// Documents that produced rows (possibly none)
    pub documents: usize,

    /// Empty or placeholder documents
    pub skipped: usize,

    /// Unreadable documents
    pub failed: usize,

    /// Rows whose file had no year entry
    pub missing_years: usize,
}

/// Builds a corpus from directories of structured documents.
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    dirs: Vec<PathBuf>,
    root: Option<PathBuf>,
    options: CorpusOptions,
}

impl CorpusBuilder {
    /// Create a builder over `dirs`.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            root: None,
            options: CorpusOptions::default(),
        }
    }

    /// Corpus root that document categories are taken relative to.
    ///
    /// Without a root, a document's category is its directory name.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set assembly options.
    pub fn with_options(mut self, options: CorpusOptions) -> Self {
        self.options = options;
        self
    }

    /// The assembly options.
    pub fn options(&self) -> &CorpusOptions {
        &self.options
    }

    /// List structured documents: sorted file names per directory,
    /// directories in the order given.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for dir in &self.dirs {
            let mut found: Vec<PathBuf> = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_structured(path))
                .collect();
            found.sort();
            log::debug!("{}: {} structured documents", dir.display(), found.len());
            files.extend(found);
        }
        Ok(files)
    }

    /// Path metadata for one structured document.
    pub fn source_info(&self, path: &Path) -> SourceInfo {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok());
        let doc_category = match relative {
            Some(rel) => first_component(rel).unwrap_or_default(),
            None => path
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        SourceInfo {
            organisation: self.options.organisation.clone(),
            doc_category,
            filename,
        }
    }

    /// Pair one already-loaded document into rows.
    pub fn rows_for(&self, source: &SourceInfo, doc: &StructuredDocument) -> Option<Vec<CorpusRow>> {
        let classifier = FontSizeClassifier::from_document(doc)?;
        log::debug!(
            "{}: dominant size {}",
            source.filename,
            classifier.dominant_size()
        );

        let classified = classifier.classify(&doc.chunks);
        let pairs = HeaderParagraphPairer::new(self.options.pairing_mode).pair(&classified);

        let rows = pairs
            .into_iter()
            .filter(|pair| !self.options.drop_empty_paragraphs || has_text(&pair.paragraph))
            .map(|pair| {
                let mut row = CorpusRow::new(source, pair);
                row.year = self
                    .options
                    .year_map
                    .as_ref()
                    .and_then(|years| years.get(&source.filename));
                row
            })
            .collect();
        Some(rows)
    }

    fn process(&self, path: &Path) -> DocumentRows {
        let doc = match StructuredDocument::from_file(path) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("could not read {}: {}", path.display(), e);
                return DocumentRows::Failed;
            }
        };

        let source = self.source_info(path);
        match self.rows_for(&source, &doc) {
            Some(rows) => DocumentRows::Rows(rows),
            None => {
                log::warn!("{}", Error::EmptyDocument(path.display().to_string()));
                DocumentRows::Skipped
            }
        }
    }

    /// Discover, classify and pair every document.
    pub fn build(&self) -> Result<Corpus> {
        let files = self.discover()?;
        let workers = if self.options.workers == 0 {
            default_workers()
        } else {
            self.options.workers
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("corpus-{}", i))
            .build()?;

        let outcomes: Vec<DocumentRows> =
            pool.install(|| files.par_iter().map(|path| self.process(path)).collect());

        let mut corpus = Corpus::default();
        for outcome in outcomes {
            match outcome {
                DocumentRows::Rows(rows) => {
                    corpus.documents += 1;
                    corpus.rows.extend(rows);
                }
                DocumentRows::Skipped => corpus.skipped += 1,
                DocumentRows::Failed => corpus.failed += 1,
            }
        }

        if self.options.year_map.is_some() {
            corpus.missing_years = corpus.rows.iter().filter(|r| r.year.is_none()).count();
            if corpus.missing_years > 0 {
                log::info!("{} rows without a year", corpus.missing_years);
            }
        }

        log::info!(
            "corpus: {} rows from {} documents ({} skipped, {} failed)",
            corpus.rows.len(),
            corpus.documents,
            corpus.skipped,
            corpus.failed
        );
        Ok(corpus)
    }
}

fn is_structured(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(STRUCTURED_SUFFIX))
}

fn first_component(path: &Path) -> Option<String> {
    let mut components = path.components().filter_map(|c| match c {
        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
        _ => None,
    });
    let first = components.next()?;
    // A file directly under the root has no category.
    components.next().map(|_| first)
}

fn has_text(text: &Option<String>) -> bool {
    text.as_deref().is_some_and(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chunk;

    fn doc(chunks: Vec<Chunk>) -> StructuredDocument {
        StructuredDocument { chunks, toc: Vec::new() }
    }

    #[test]
    fn test_year_map_accepts_ints_and_strings() {
        let years = YearMap::parse_str(r#"{"a_structured.json": 2016, "b_structured.json": "2019"}"#)
            .unwrap();
        assert_eq!(years.get("a_structured.json"), Some(2016));
        assert_eq!(years.get("b_structured.json"), Some(2019));
        assert_eq!(years.get("c"), None);

        assert!(YearMap::parse_str(r#"{"a": "soon"}"#).is_err());
        assert!(YearMap::parse_str("[1, 2]").is_err());
    }

    #[test]
    fn test_source_info_relative_to_root() {
        let builder = CorpusBuilder::new(["/data/ieo"]).with_root("/data");
        let info = builder.source_info(Path::new("/data/ieo/0484(2016)_structured.json"));
        assert_eq!(info.organisation, "EIA");
        assert_eq!(info.doc_category, "ieo");
        assert_eq!(info.filename, "0484(2016)_structured.json");
    }

    #[test]
    fn test_source_info_without_root_uses_parent() {
        let builder = CorpusBuilder::new(["/data/steo"]);
        let info = builder.source_info(Path::new("/data/steo/apr14_structured.json"));
        assert_eq!(info.doc_category, "steo");
    }

    #[test]
    fn test_rows_for_attaches_metadata_and_years() {
        let mut years = YearMap::new();
        years.insert("x_structured.json", 2014);
        let builder = CorpusBuilder::new(Vec::<PathBuf>::new())
            .with_options(CorpusOptions::new().with_organisation("IEA").with_year_map(years));
        let source = SourceInfo {
            organisation: "IEA".into(),
            doc_category: "weo".into(),
            filename: "x_structured.json".into(),
        };

        let rows = builder
            .rows_for(
                &source,
                &doc(vec![
                    Chunk::new(0, 20, "Outlook"),
                    Chunk::new(0, 12, "Demand grows steadily"),
                ]),
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].organisation, "IEA");
        assert_eq!(rows[0].header_text.as_deref(), Some("Outlook"));
        assert_eq!(rows[0].year, Some(2014));
    }

    #[test]
    fn test_drop_empty_paragraphs() {
        let chunks = vec![Chunk::new(0, 20, "A"), Chunk::new(0, 20, "B"), Chunk::new(0, 12, "body text")];
        let source = SourceInfo::default();

        let keep = CorpusBuilder::new(Vec::<PathBuf>::new());
        assert_eq!(keep.rows_for(&source, &doc(chunks.clone())).unwrap().len(), 2);

        let drop = CorpusBuilder::new(Vec::<PathBuf>::new())
            .with_options(CorpusOptions::new().with_drop_empty_paragraphs(true));
        let rows = drop.rows_for(&source, &doc(chunks)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].header_text.as_deref(), Some("B"));
    }

    #[test]
    fn test_placeholder_document_skipped() {
        let builder = CorpusBuilder::new(Vec::<PathBuf>::new());
        assert!(builder
            .rows_for(&SourceInfo::default(), &doc(vec![Chunk::default()]))
            .is_none());
    }
}
