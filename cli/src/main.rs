//! pdfchunk CLI - layout dumps to structured documents and corpora

use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use pdfchunk::convert::batch::load_manifest;
use pdfchunk::render::{to_json, write_json};
use pdfchunk::{
    BatchEvent, BatchReport, BatchRunner, CaptionFilter, Collection, ConvertConfig, Converter,
    CorpusBuilder, CorpusOptions, FontSizeClassifier, JsonFormat, PairingMode, StructuredDocument,
    YearMap,
};

#[derive(Parser)]
#[command(name = "pdfchunk")]
#[command(version)]
#[command(about = "Turn report layout dumps into structured documents and header/paragraph corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every layout dump in a directory
    Convert {
        /// Collection directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Collection config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Merge <stem>.conf files over the collection config
        #[arg(long)]
        per_doc_config: bool,

        /// Caption filter applied before normalization
        #[arg(long, value_enum)]
        filter: Option<FilterKind>,

        /// Worker threads (default: all cores but one)
        #[arg(short, long, env = "PDFCHUNK_JOBS", default_value = "0")]
        jobs: usize,

        /// Suffix identifying layout dump files
        #[arg(long, default_value = pdfchunk::convert::batch::DEFAULT_SOURCE_SUFFIX)]
        suffix: String,

        /// Collection name used in logs (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Convert the collections listed in a manifest, concurrently
    Bulk {
        /// Manifest: JSON array of collections
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Worker threads per collection
        #[arg(short, long, env = "PDFCHUNK_JOBS", default_value = "0")]
        jobs: usize,
    },

    /// Convert a single layout dump
    File {
        /// Layout dump
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Caption filter applied before normalization
        #[arg(long, value_enum)]
        filter: Option<FilterKind>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Pair structured documents into a header/paragraph corpus
    Corpus {
        /// Directories of structured documents
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Corpus root; categories are the first directory below it
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Organisation recorded on every row
        #[arg(long, default_value = pdfchunk::corpus::DEFAULT_ORGANISATION)]
        organisation: String,

        /// JSON map of file name to publication year
        #[arg(long, value_name = "FILE")]
        year_map: Option<PathBuf>,

        /// Drop rows without paragraph text
        #[arg(long)]
        drop_empty_paragraphs: bool,

        /// Keep a leading paragraph that no heading precedes
        #[arg(long)]
        keep_orphans: bool,

        /// Worker threads (default: all cores but one)
        #[arg(short, long, env = "PDFCHUNK_JOBS", default_value = "0")]
        jobs: usize,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show structured document statistics
    Info {
        /// Structured document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FilterKind {
    /// "Figure 3." / "Table A2-1." captions
    Ieo,
    /// "Table 12." / "Figure MT-4." captions
    Aeo,
}

impl From<FilterKind> for CaptionFilter {
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Ieo => CaptionFilter::Ieo,
            FilterKind::Aeo => CaptionFilter::Aeo,
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            dir,
            config,
            per_doc_config,
            filter,
            jobs,
            suffix,
            name,
        } => cmd_convert(dir, config, per_doc_config, filter, jobs, suffix, name),
        Commands::Bulk { manifest, jobs } => cmd_bulk(&manifest, jobs),
        Commands::File {
            source,
            output,
            config,
            filter,
            compact,
        } => cmd_file(&source, output.as_deref(), config.as_deref(), filter, compact),
        Commands::Corpus {
            dirs,
            output,
            root,
            organisation,
            year_map,
            drop_empty_paragraphs,
            keep_orphans,
            jobs,
            compact,
        } => {
            let mode = if keep_orphans {
                PairingMode::KeepOrphans
            } else {
                PairingMode::Compatible
            };
            cmd_corpus(
                dirs,
                output.as_deref(),
                root,
                organisation,
                year_map.as_deref(),
                drop_empty_paragraphs,
                mode,
                jobs,
                compact,
            )
        }
        Commands::Info { input, json } => cmd_info(&input, json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

/// Drive a progress bar from batch events until every sender is dropped.
fn track(pb: &ProgressBar, events: Receiver<BatchEvent>) {
    for event in events {
        match event {
            BatchEvent::Planned { documents, .. } => pb.inc_length(documents as u64),
            BatchEvent::Started { source } => {
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                pb.set_message(name);
            }
            BatchEvent::Finished(result) => {
                if !result.success {
                    pb.println(format!(
                        "{} {}",
                        "failed".red(),
                        result.source.display()
                    ));
                }
                pb.inc(1);
            }
        }
    }
}

fn print_report(report: &BatchReport) {
    let failed = report.failed();
    let status = if failed == 0 {
        "ok".green().bold()
    } else {
        "partial".yellow().bold()
    };
    println!(
        "{} {}: {} converted, {} failed",
        status,
        report.collection.bold(),
        report.succeeded(),
        failed
    );
    for result in report.results.iter().filter(|r| !r.success) {
        println!(
            "  {} {}: {}",
            "└─".dimmed(),
            result.source.display(),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn cmd_convert(
    dir: PathBuf,
    config: Option<PathBuf>,
    per_doc_config: bool,
    filter: Option<FilterKind>,
    jobs: usize,
    suffix: String,
    name: Option<String>,
) -> CliResult<()> {
    let name = name.unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "collection".to_string())
    });

    let mut collection = Collection::new(name, dir)
        .with_per_doc_config(per_doc_config)
        .with_source_suffix(suffix);
    if let Some(path) = config {
        collection = collection.with_config(path);
    }
    if let Some(kind) = filter {
        collection = collection.with_caption_filter(kind.into());
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    let runner = BatchRunner::new().with_workers(jobs).with_events(tx);
    log::debug!(
        "collection {} in {} with {} workers",
        collection.name,
        collection.dir.display(),
        runner.workers()
    );
    let pb = progress_bar();

    let report = thread::scope(|s| {
        let handle = s.spawn(move || {
            let report = runner.run(&collection);
            drop(runner);
            report
        });
        track(&pb, rx);
        handle.join()
    })
    .map_err(|_| "conversion thread panicked")??;

    pb.finish_and_clear();
    print_report(&report);
    Ok(())
}

fn cmd_bulk(manifest: &Path, jobs: usize) -> CliResult<()> {
    let collections = load_manifest(manifest)?;
    for collection in &collections {
        log::debug!("manifest entry {}: {}", collection.name, collection.dir.display());
    }
    println!(
        "{} {} collections from {}",
        "Converting".cyan(),
        collections.len(),
        manifest.display()
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let runner = BatchRunner::new().with_workers(jobs).with_events(tx);
    let pb = progress_bar();

    let reports = thread::scope(|s| {
        let handle = s.spawn(move || {
            let reports = runner.run_collections(&collections);
            drop(runner);
            reports
        });
        track(&pb, rx);
        handle.join()
    })
    .map_err(|_| "conversion thread panicked")??;

    pb.finish_and_clear();
    for report in &reports {
        print_report(report);
    }

    let failed: usize = reports.iter().map(BatchReport::failed).sum();
    let total: usize = reports.iter().map(BatchReport::total).sum();
    println!(
        "\n{} {} of {} documents converted",
        "Done!".green().bold(),
        total - failed,
        total
    );
    Ok(())
}

fn cmd_file(
    source: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    filter: Option<FilterKind>,
    compact: bool,
) -> CliResult<()> {
    let config = match config {
        Some(path) => ConvertConfig::from_file(path)?,
        None => ConvertConfig::default(),
    };
    let format = JsonFormat::from_compact(compact);
    let options = config
        .compile()?
        .with_text_filter(filter.map(|kind| CaptionFilter::from(kind).to_filter()))
        .with_format(format);

    let converter = Converter::new();
    if let Some(path) = output {
        let doc = converter.convert_to_file(source, path, &options)?;
        println!(
            "{} {} ({} chunks, {} TOC entries)",
            "Saved to".green(),
            path.display(),
            doc.chunks.len(),
            doc.toc.len()
        );
    } else {
        let doc = converter.convert_file(source, &options)?;
        println!("{}", to_json(&doc, format)?);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_corpus(
    dirs: Vec<PathBuf>,
    output: Option<&Path>,
    root: Option<PathBuf>,
    organisation: String,
    year_map: Option<&Path>,
    drop_empty_paragraphs: bool,
    mode: PairingMode,
    jobs: usize,
    compact: bool,
) -> CliResult<()> {
    let mut options = CorpusOptions::new()
        .with_organisation(organisation)
        .with_pairing_mode(mode)
        .with_drop_empty_paragraphs(drop_empty_paragraphs)
        .with_workers(jobs);
    if let Some(path) = year_map {
        let years = YearMap::from_file(path)?;
        log::debug!("{} year entries from {}", years.len(), path.display());
        options = options.with_year_map(years);
    }

    let mut builder = CorpusBuilder::new(dirs).with_options(options);
    if let Some(root) = root {
        builder = builder.with_root(root);
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message("Pairing structured documents...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    let corpus = builder.build()?;
    pb.finish_and_clear();

    let format = JsonFormat::from_compact(compact);
    match output {
        Some(path) => {
            write_json(path, &corpus.rows, format)?;
            println!(
                "{} {} rows from {} documents to {}",
                "Wrote".green(),
                corpus.rows.len(),
                corpus.documents,
                path.display()
            );
            if corpus.skipped > 0 || corpus.failed > 0 {
                println!(
                    "  {} {} skipped, {} failed",
                    "└─".dimmed(),
                    corpus.skipped,
                    corpus.failed
                );
            }
        }
        None => println!("{}", to_json(&corpus.rows, format)?),
    }

    Ok(())
}

#[derive(Serialize)]
struct DocumentInfo {
    file: PathBuf,
    chunks: usize,
    toc_entries: usize,
    pages: usize,
    characters: usize,
    dominant_size: Option<u32>,
    headings: usize,
    sizes: Vec<(u32, usize)>,
}

impl DocumentInfo {
    fn collect(file: &Path, doc: &StructuredDocument) -> Self {
        let classifier = FontSizeClassifier::from_document(doc);
        let headings = classifier
            .as_ref()
            .map(|c| c.classify(&doc.chunks).iter().filter(|c| c.is_heading()).count())
            .unwrap_or(0);

        let mut pages: Vec<u32> = doc.chunks.iter().map(|c| c.page).collect();
        pages.sort_unstable();
        pages.dedup();

        Self {
            file: file.to_path_buf(),
            chunks: doc.chunks.len(),
            toc_entries: doc.toc.len(),
            pages: pages.len(),
            characters: doc.chunks.iter().map(|c| c.char_count()).sum(),
            dominant_size: classifier.as_ref().map(FontSizeClassifier::dominant_size),
            headings,
            sizes: classifier.map(|c| c.histogram().to_vec()).unwrap_or_default(),
        }
    }
}

fn cmd_info(input: &Path, json: bool) -> CliResult<()> {
    let doc = StructuredDocument::from_file(input)?;
    let info = DocumentInfo::collect(input, &doc);

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), info.file.display());
    println!("{}: {}", "Chunks".bold(), info.chunks);
    println!("{}: {}", "TOC entries".bold(), info.toc_entries);
    println!("{}: {}", "Pages with text".bold(), info.pages);
    println!("{}: {}", "Characters".bold(), info.characters);

    println!();
    println!("{}", "Font Sizes".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    match info.dominant_size {
        Some(size) => {
            println!("{}: {}", "Body size".bold(), size);
            println!("{}: {}", "Headings".bold(), info.headings);
            for (size, chars) in &info.sizes {
                println!("  {} {:>3}: {} chars", "├─".dimmed(), size, chars);
            }
        }
        None => println!("{}", "empty document".yellow()),
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfchunk".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout dumps to header/paragraph corpora");
}
