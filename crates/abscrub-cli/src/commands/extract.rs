use abscrub_core::config::{load_config, validate_config, Config};
use abscrub_core::error::AbscrubError;
use abscrub_core::extraction::extract_pdf;
use abscrub_core::extraction::pdftotext::PdftotextSource;
use abscrub_core::outcome::{ExtractionOutcome, OutcomeLogs};
use abscrub_core::{extract_document, wordfile};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

use super::{list_documents, prepare_batch, select_work, BatchArgs};
use crate::{output, pool};

/// Layout options shared by `extract` and `extract-pdf`.
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Rescale word boxes into 0..1000 page coordinates
    #[arg(long)]
    pub normalize_bbox: bool,

    /// Cut each document at its reference section heading
    #[arg(long)]
    pub remove_references: bool,

    /// Document language, used for reference headings (e.g. "fr")
    #[arg(long, value_name = "LANG")]
    pub lang: Option<String>,

    /// JSON config file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl LayoutArgs {
    fn to_config(&self) -> Result<Config, AbscrubError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        if self.normalize_bbox {
            config.extract.normalize_bbox = true;
        }
        if self.remove_references {
            config.extract.remove_references = true;
        }
        if let Some(lang) = &self.lang {
            config.extract.language = Some(lang.clone());
        }
        validate_config(&config)?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Directory of layout markup files (.html)
    #[arg(long, value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Directory receiving one word file per document
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Log of successfully parsed document ids
    #[arg(long, value_name = "FILE", default_value = "parsed.txt")]
    pub parsed_log: PathBuf,

    /// Log of document ids without usable text
    #[arg(long, value_name = "FILE", default_value = "not_parsed.txt")]
    pub not_parsed_log: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run(args: ExtractArgs) -> Result<(), AbscrubError> {
    let config = args.layout.to_config()?.extract;
    let done = prepare_batch(
        &args.batch,
        &[args.input_dir.as_path()],
        &[args.output_dir.as_path()],
        &[args.parsed_log.as_path(), args.not_parsed_log.as_path()],
    )?;
    let docs = select_work(
        list_documents(&args.input_dir, &["html", "xhtml", "xml"])?,
        &done,
        args.batch.limit,
    );
    let jobs = args.batch.jobs.unwrap_or_else(pool::default_jobs);
    log::info!("extracting {} documents on {} workers", docs.len(), jobs);

    let logs = OutcomeLogs::open(&args.parsed_log, &args.not_parsed_log)?;
    let outcomes = pool::run(&docs, jobs, |(id, path)| {
        let out = args.output_dir.join(format!("{}.txt", id));
        let outcome = extract_document(id, path, &out, &config, Some(&logs));
        (id.clone(), outcome)
    })?;

    output::json::print_summary(outcomes.iter().map(|(id, o)| {
        let reason = match o {
            ExtractionOutcome::Failed { reason } => Some(reason.as_str()),
            _ => None,
        };
        (id.as_str(), o.label(), reason)
    }))
}

#[derive(Args, Debug)]
pub struct ExtractPdfArgs {
    /// Path to a PDF file
    pub pdf_file: PathBuf,

    /// Write the word file here instead of stdout
    #[arg(short = 'O', long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub layout: LayoutArgs,
}

pub fn run_pdf(args: ExtractPdfArgs) -> Result<(), AbscrubError> {
    let config = args.layout.to_config()?.extract;
    if !PdftotextSource::is_available() {
        return Err(AbscrubError::PdftotextNotFound);
    }
    let pdf_bytes = std::fs::read(&args.pdf_file)?;
    let source = PdftotextSource::new();

    let Some(doc) = extract_pdf(&pdf_bytes, &source, &config)? else {
        eprintln!("{}: no text content", args.pdf_file.display());
        return Ok(());
    };

    match args.out {
        Some(path) => {
            wordfile::save_document(&doc, &path)?;
            eprintln!(
                "Extracted {} page(s), {} word(s), written to {}",
                doc.page_count(),
                doc.word_count(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            wordfile::write_document(&doc, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}
