//! Batch conversion of document collections on worker pools.
//!
//! Each document is converted by one pool task that owns its runs, filter,
//! merger and normalizer. Failures are isolated per document and reported
//! as `(source, success)` results; only configuration validation errors
//! abort the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ConvertOptions, Converter};
use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::structure::{CaptionFilter, TextFilter};

/// Default suffix of layout dump files.
pub const DEFAULT_SOURCE_SUFFIX: &str = ".layout.json";

/// Suffix appended to a document stem for its structured output.
pub const STRUCTURED_SUFFIX: &str = "_structured.json";

/// Extension of per-document config files.
pub const DOC_CONFIG_EXTENSION: &str = "conf";

/// Worker count used when none is given: all cores but one, at least one.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

fn default_suffix() -> String {
    DEFAULT_SOURCE_SUFFIX.to_string()
}

/// A directory of documents sharing a configuration and text filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name, used in logs and reports
    pub name: String,

    /// Directory holding the layout dumps
    pub dir: PathBuf,

    /// Collection-wide config file
    #[serde(default)]
    pub config: Option<PathBuf>,

    /// Whether `<stem>.conf` files override the collection config
    #[serde(default)]
    pub per_doc_config: bool,

    /// Built-in caption filter
    #[serde(default)]
    pub caption_filter: Option<CaptionFilter>,

    /// Suffix identifying layout dump files
    #[serde(default = "default_suffix")]
    pub source_suffix: String,

    /// Custom text filter, takes precedence over `caption_filter`
    #[serde(skip)]
    pub text_filter: Option<TextFilter>,
}

impl Collection {
    /// Create a collection for a directory.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            config: None,
            per_doc_config: false,
            caption_filter: None,
            source_suffix: default_suffix(),
            text_filter: None,
        }
    }

    /// Set the collection config file.
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = Some(path.into());
        self
    }

    /// Enable per-document config overrides.
    pub fn with_per_doc_config(mut self, enabled: bool) -> Self {
        self.per_doc_config = enabled;
        self
    }

    /// Use a built-in caption filter.
    pub fn with_caption_filter(mut self, filter: CaptionFilter) -> Self {
        self.caption_filter = Some(filter);
        self
    }

    /// Use a custom text filter.
    pub fn with_text_filter(mut self, filter: TextFilter) -> Self {
        self.text_filter = Some(filter);
        self
    }

    /// Set the layout dump suffix.
    pub fn with_source_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.source_suffix = suffix.into();
        self
    }

    /// The text filter documents of this collection use.
    pub fn resolved_filter(&self) -> Option<TextFilter> {
        self.text_filter
            .clone()
            .or_else(|| self.caption_filter.map(CaptionFilter::to_filter))
    }

    /// List layout dumps in the collection directory, sorted by name.
    ///
    /// Structured outputs and the collection config never count as sources,
    /// even when the suffix would match them.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let config = self.config.as_deref().and_then(|p| fs::canonicalize(p).ok());
        let mut sources = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_source = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| {
                        n.ends_with(&self.source_suffix)
                            && n.len() > self.source_suffix.len()
                            && !n.ends_with(STRUCTURED_SUFFIX)
                    })
                && (config.is_none() || fs::canonicalize(&path).ok() != config);
            if is_source {
                sources.push(path);
            }
        }
        sources.sort();
        Ok(sources)
    }

    /// Document stem: the file name without the source suffix.
    pub fn stem_of(&self, source: &Path) -> Result<String> {
        source
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(&self.source_suffix))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::MissingPath(format!("no document name in {}", source.display())))
    }

    /// Where the structured output of `source` is written.
    pub fn output_for(&self, source: &Path) -> Result<PathBuf> {
        let stem = self.stem_of(source)?;
        let dir = source.parent().unwrap_or(&self.dir);
        Ok(dir.join(format!("{}{}", stem, STRUCTURED_SUFFIX)))
    }

    /// Per-document config path for `source`, if one exists on disk.
    pub fn doc_config_for(&self, source: &Path) -> Result<Option<PathBuf>> {
        let stem = self.stem_of(source)?;
        let dir = source.parent().unwrap_or(&self.dir);
        let path = dir.join(format!("{}.{}", stem, DOC_CONFIG_EXTENSION));
        Ok(path.is_file().then_some(path))
    }

    fn defaults(&self) -> Result<Map<String, Value>> {
        match &self.config {
            Some(path) => ConvertConfig::read_object(path),
            None => Ok(Map::new()),
        }
    }

    /// Resolve every document's job before any work is dispatched.
    ///
    /// Returns the runnable jobs plus per-document failures found while
    /// loading configs. Fatal configuration errors abort planning.
    pub fn plan(&self) -> Result<(Vec<DocumentJob>, Vec<DocumentResult>)> {
        let defaults = self.defaults()?;
        let filter = self.resolved_filter();
        let mut jobs = Vec::new();
        let mut failures = Vec::new();

        for source in self.discover()? {
            match self.plan_document(&source, &defaults) {
                Ok(config) => {
                    let options = config.compile()?.with_text_filter(filter.clone());
                    let output = self.output_for(&source)?;
                    jobs.push(DocumentJob::new(source, output, options));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("skipping {}: {}", source.display(), e);
                    failures.push(DocumentResult::failed(source, &e));
                }
            }
        }

        Ok((jobs, failures))
    }

    fn plan_document(&self, source: &Path, defaults: &Map<String, Value>) -> Result<ConvertConfig> {
        if !self.per_doc_config {
            return ConvertConfig::from_object(defaults.clone());
        }
        match self.doc_config_for(source)? {
            Some(path) => ConvertConfig::merged(defaults, ConvertConfig::read_object(&path)?),
            None => {
                log::warn!(
                    "no config file found for {}, falling back onto defaults",
                    source.display()
                );
                ConvertConfig::from_object(defaults.clone())
            }
        }
    }
}

/// One document to convert.
#[derive(Debug, Clone)]
pub struct DocumentJob {
    /// Layout dump path
    pub source: PathBuf,

    /// Structured document output path
    pub output: PathBuf,

    /// Compiled options for this document
    pub options: ConvertOptions,
}

impl DocumentJob {
    /// Create a job.
    pub fn new(source: PathBuf, output: PathBuf, options: ConvertOptions) -> Self {
        Self {
            source,
            output,
            options,
        }
    }
}

/// Outcome of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentResult {
    /// Source identifier (layout dump path)
    pub source: PathBuf,

    /// Whether the structured document was written
    pub success: bool,

    /// Error message on failure
    pub error: Option<String>,

    /// Body chunks written
    pub chunks: usize,

    /// TOC entries written
    pub toc_entries: usize,
}

impl DocumentResult {
    fn succeeded(source: PathBuf, chunks: usize, toc_entries: usize) -> Self {
        Self {
            source,
            success: true,
            error: None,
            chunks,
            toc_entries,
        }
    }

    fn failed(source: PathBuf, error: &Error) -> Self {
        Self {
            source,
            success: false,
            error: Some(error.to_string()),
            chunks: 0,
            toc_entries: 0,
        }
    }
}

/// Aggregated outcome of a collection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Collection name
    pub collection: String,

    /// Per-document results, in discovery order
    pub results: Vec<DocumentResult>,
}

impl BatchReport {
    /// Number of documents converted.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of documents that failed.
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Total documents seen.
    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Progress events sent while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A collection was planned.
    Planned {
        /// Collection name
        collection: String,
        /// Documents to convert
        documents: usize,
    },

    /// A document started converting.
    Started {
        /// Layout dump path
        source: PathBuf,
    },

    /// A document finished, successfully or not.
    Finished(DocumentResult),
}

/// Runs collections on worker pools.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    converter: Converter,
    workers: usize,
    events: Option<Sender<BatchEvent>>,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    /// Create a runner with the default worker count.
    pub fn new() -> Self {
        Self {
            converter: Converter::new(),
            workers: default_workers(),
            events: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the worker count per collection pool (0 means the default).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { default_workers() } else { workers };
        self
    }

    /// Use a specific converter.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Send progress events to `sender`.
    pub fn with_events(mut self, sender: Sender<BatchEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Worker count per pool.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Flag that cancels the batch when set.
    ///
    /// Documents already converting finish; no new ones start, and the run
    /// returns [`Error::Cancelled`] without a report.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Plan and convert one collection.
    pub fn run(&self, collection: &Collection) -> Result<BatchReport> {
        let (jobs, failures) = collection.plan()?;
        self.emit(BatchEvent::Planned {
            collection: collection.name.clone(),
            documents: jobs.len() + failures.len(),
        });
        for failure in &failures {
            self.emit(BatchEvent::Finished(failure.clone()));
        }

        let mut report = self.run_jobs(&collection.name, jobs)?;
        report.results.extend(failures);
        report.results.sort_by(|a, b| a.source.cmp(&b.source));
        log::info!(
            "{}: {} converted, {} failed",
            report.collection,
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Convert already-planned jobs on a fresh pool.
    pub fn run_jobs(&self, name: &str, jobs: Vec<DocumentJob>) -> Result<BatchReport> {
        let prefix = name.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()?;

        let results: Vec<Option<DocumentResult>> =
            pool.install(|| jobs.par_iter().map(|job| self.run_job(job)).collect());

        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(BatchReport {
            collection: name.to_string(),
            results: results.into_iter().flatten().collect(),
        })
    }

    fn run_job(&self, job: &DocumentJob) -> Option<DocumentResult> {
        if self.is_cancelled() {
            return None;
        }
        self.emit(BatchEvent::Started {
            source: job.source.clone(),
        });

        let result = match self
            .converter
            .convert_to_file(&job.source, &job.output, &job.options)
        {
            Ok(doc) => DocumentResult::succeeded(job.source.clone(), doc.chunks.len(), doc.toc.len()),
            Err(e) => {
                log::warn!("convert failed for {}: {}", job.source.display(), e);
                DocumentResult::failed(job.source.clone(), &e)
            }
        };

        self.emit(BatchEvent::Finished(result.clone()));
        Some(result)
    }

    /// Convert several collections concurrently, one pool each.
    ///
    /// Reports come back in input order. The first error in input order is
    /// returned if any collection fails as a whole.
    pub fn run_collections(&self, collections: &[Collection]) -> Result<Vec<BatchReport>> {
        let outcomes: Vec<Result<BatchReport>> = thread::scope(|scope| {
            let handles: Vec<_> = collections
                .iter()
                .map(|c| scope.spawn(move || self.run(c)))
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .unwrap_or_else(|_| Err(Error::Other("collection worker panicked".into())))
                })
                .collect()
        });

        outcomes.into_iter().collect()
    }
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a collection manifest: a JSON array of collections.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<Collection>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_default_workers_at_least_one() {
        assert!(default_workers() >= 1);
        assert_eq!(BatchRunner::new().with_workers(3).workers(), 3);
        assert!(BatchRunner::new().with_workers(0).workers() >= 1);
    }

    #[test]
    fn test_discover_and_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.layout.json", "[]");
        write(dir.path(), "a.layout.json", "[]");
        write(dir.path(), "notes.txt", "");
        write(dir.path(), ".layout.json", "[]");

        let collection = Collection::new("test", dir.path());
        let sources = collection.discover().unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].ends_with("a.layout.json"));
        assert_eq!(
            collection.output_for(&sources[0]).unwrap(),
            dir.path().join("a_structured.json")
        );
    }

    #[test]
    fn test_discover_skips_outputs_and_config() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", "[]");
        write(dir.path(), "a_structured.json", r#"{"doc": []}"#);
        let config = write(dir.path(), "collection.json", r#"{"to_filter": false}"#);

        let collection = Collection::new("test", dir.path())
            .with_source_suffix(".json")
            .with_config(config);
        let sources = collection.discover().unwrap();
        assert_eq!(sources, vec![dir.path().join("a.json")]);
    }

    #[test]
    fn test_plan_per_doc_config() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = write(dir.path(), "defaults.json", r#"{"table_of_contents": [1]}"#);
        write(dir.path(), "a.layout.json", "[]");
        write(dir.path(), "a.conf", r#"{"table_of_contents": [7]}"#);
        write(dir.path(), "b.layout.json", "[]");

        let collection = Collection::new("test", dir.path())
            .with_config(defaults)
            .with_per_doc_config(true);
        let (jobs, failures) = collection.plan().unwrap();
        assert!(failures.is_empty());
        assert!(jobs[0].options.toc_pages.contains(&7));
        assert!(jobs[1].options.toc_pages.contains(&1));
    }

    #[test]
    fn test_plan_unreadable_doc_config_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.layout.json", "[]");
        write(dir.path(), "a.conf", "{not json");
        write(dir.path(), "b.layout.json", "[]");

        let collection = Collection::new("test", dir.path()).with_per_doc_config(true);
        let (jobs, failures) = collection.plan().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(failures.len(), 1);
        assert!(!failures[0].success);
    }

    #[test]
    fn test_plan_bad_sentinel_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.layout.json", "[]");
        write(dir.path(), "a.conf", r#"{"exclusions_page": [-1, 4]}"#);

        let collection = Collection::new("test", dir.path()).with_per_doc_config(true);
        let err = collection.plan().unwrap_err();
        assert!(matches!(err, Error::InvalidPageRange(_)));
    }

    #[test]
    fn test_manifest_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write(
            dir.path(),
            "collections.json",
            r#"[{"name": "ieo", "dir": "data/ieo", "caption_filter": "ieo"}]"#,
        );
        let collections = load_manifest(manifest).unwrap();
        assert_eq!(collections[0].source_suffix, DEFAULT_SOURCE_SUFFIX);
        assert_eq!(collections[0].caption_filter, Some(CaptionFilter::Ieo));
        assert!(collections[0].resolved_filter().is_some());
    }
}
