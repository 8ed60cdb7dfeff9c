use abscrub_core::abstracts::{read_abstract_records, AbstractRecord};
use abscrub_core::config::{load_config, validate_config, Config};
use abscrub_core::error::AbscrubError;
use abscrub_core::outcome::{ImageOutcome, OutcomeLogs, RedactionOutcome};
use abscrub_core::{process_document, DocumentPaths};
use clap::Args;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{list_documents, prepare_batch, select_work, BatchArgs};
use crate::{output, pool};

const ARCHIVE_SUFFIX: &str = ".tar.gz";

#[derive(Args, Debug)]
pub struct RedactArgs {
    /// Directory of word files (<id>.txt)
    #[arg(long, value_name = "DIR")]
    pub text_dir: PathBuf,

    /// JSONL file of abstract records
    #[arg(long, value_name = "FILE")]
    pub abstracts: PathBuf,

    /// Directory receiving the redacted word files
    #[arg(long, value_name = "DIR")]
    pub output_text_dir: PathBuf,

    /// Directory of page image archives (<id>.tar.gz)
    #[arg(long, value_name = "DIR", requires = "output_img_dir")]
    pub img_dir: Option<PathBuf>,

    /// Directory receiving the redacted image archives
    #[arg(long, value_name = "DIR", requires = "img_dir")]
    pub output_img_dir: Option<PathBuf>,

    /// Language whose abstract a multilingual record must have
    #[arg(long, value_name = "LANG")]
    pub main_lang: Option<String>,

    /// Skip documents whose main abstract has fewer words
    #[arg(long, value_name = "N")]
    pub min_abstract_words: Option<usize>,

    /// Edit budget of the fuzzy search (default 15)
    #[arg(long, value_name = "N")]
    pub max_edit_distance: Option<usize>,

    /// Log of ids whose abstracts were removed
    #[arg(long, value_name = "FILE", default_value = "found.txt")]
    pub found_log: PathBuf,

    /// Log of ids whose abstracts were not found
    #[arg(long, value_name = "FILE", default_value = "failed.txt")]
    pub failed_log: PathBuf,

    /// JSON config file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub batch: BatchArgs,
}

impl RedactArgs {
    fn to_config(&self) -> Result<Config, AbscrubError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        let redact = &mut config.redact;
        if let Some(lang) = &self.main_lang {
            redact.main_lang = Some(lang.clone());
        }
        if let Some(n) = self.min_abstract_words {
            redact.min_abstract_words = n;
        }
        if let Some(n) = self.max_edit_distance {
            redact.max_edit_distance = n;
        }
        redact.redact_images = self.img_dir.is_some();
        validate_config(&config)?;
        Ok(config)
    }

    fn paths(&self, id: &str, word_file: &Path) -> DocumentPaths {
        let images = match (&self.img_dir, &self.output_img_dir) {
            (Some(input), Some(output)) => {
                let name = format!("{}{}", id, ARCHIVE_SUFFIX);
                Some((input.join(&name), output.join(&name)))
            }
            _ => None,
        };
        DocumentPaths {
            word_file: word_file.to_path_buf(),
            output_word_file: self.output_text_dir.join(format!("{}.txt", id)),
            images,
        }
    }
}

pub fn run(args: RedactArgs) -> Result<(), AbscrubError> {
    let config = args.to_config()?.redact;

    let mut inputs = vec![args.text_dir.as_path()];
    let mut outputs = vec![args.output_text_dir.as_path()];
    if let (Some(img), Some(out)) = (&args.img_dir, &args.output_img_dir) {
        inputs.push(img.as_path());
        outputs.push(out.as_path());
    }
    let done = prepare_batch(
        &args.batch,
        &inputs,
        &outputs,
        &[args.found_log.as_path(), args.failed_log.as_path()],
    )?;

    let records: HashMap<String, AbstractRecord> = read_abstract_records(&args.abstracts)?
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();
    log::info!("loaded {} abstract records", records.len());

    let docs = select_work(
        list_documents(&args.text_dir, &["txt"])?,
        &done,
        args.batch.limit,
    );
    let jobs = args.batch.jobs.unwrap_or_else(pool::default_jobs);
    log::info!("redacting {} documents on {} workers", docs.len(), jobs);

    let logs = OutcomeLogs::open(&args.found_log, &args.failed_log)?;
    let outcomes = pool::run(&docs, jobs, |(id, word_file)| {
        let paths = args.paths(id, word_file);
        let outcome = process_document(id, records.get(id), &paths, &config, Some(&logs));
        (id.clone(), outcome)
    })?;

    output::json::print_summary(outcomes.iter().map(|(id, o)| {
        let reason = match o {
            RedactionOutcome::Failed { reason } => Some(reason.as_str()),
            RedactionOutcome::Redacted {
                image: ImageOutcome::Failed { reason },
                ..
            } => Some(reason.as_str()),
            _ => None,
        };
        (id.as_str(), o.label(), reason)
    }))
}
