pub mod abstracts;
pub mod config;
pub mod error;
pub mod extraction;
pub mod locate;
pub mod model;
pub mod outcome;
pub mod redact;
pub mod wordfile;

use abstracts::{select_candidates, AbstractRecord, AbstractSelection};
use config::{ExtractConfig, RedactConfig};
use error::AbscrubError;
use locate::SpanLocator;
use model::AbstractCandidate;
use outcome::{ExtractionOutcome, ImageOutcome, OutcomeLogs, RedactionOutcome};
use redact::image::{page_redactions, redact_archive};
use redact::{find_abstracts, redact_text_file, LineRanges};
use std::path::{Path, PathBuf};

/// Convert one layout markup file into a word file.
///
/// Never fails: unreadable markup becomes [`ExtractionOutcome::Failed`].
/// The id goes to the success log when a word file is written and to the
/// failure log otherwise.
pub fn extract_document(
    doc_id: &str,
    markup: &Path,
    output: &Path,
    config: &ExtractConfig,
    logs: Option<&OutcomeLogs>,
) -> ExtractionOutcome {
    let outcome = match extraction::extract_markup_file(markup, config)
        .and_then(|doc| doc.map(|d| save(&d, output)).transpose())
    {
        Ok(Some((pages, words))) => ExtractionOutcome::Parsed { pages, words },
        Ok(None) => ExtractionOutcome::NoContent,
        Err(e) => ExtractionOutcome::Failed {
            reason: e.to_string(),
        },
    };

    match &outcome {
        ExtractionOutcome::Parsed { pages, words } => {
            log::info!("{}: parsed {} pages, {} words", doc_id, pages, words)
        }
        ExtractionOutcome::NoContent => log::info!("{}: no text content", doc_id),
        ExtractionOutcome::Failed { reason } => log::warn!("{}: {}", doc_id, reason),
    }
    if let Some(logs) = logs {
        let log = if outcome.is_success() {
            &logs.success
        } else {
            &logs.failure
        };
        if let Err(e) = log.append(doc_id) {
            log::warn!("{}: cannot write {}: {}", doc_id, log.path().display(), e);
        }
    }
    outcome
}

fn save(doc: &model::Document, output: &Path) -> Result<(usize, usize), AbscrubError> {
    wordfile::save_document(doc, output)?;
    Ok((doc.page_count(), doc.word_count()))
}

/// Input and output locations of one document.
#[derive(Debug, Clone)]
pub struct DocumentPaths {
    pub word_file: PathBuf,
    pub output_word_file: PathBuf,
    /// Page image archive and where its redacted copy goes.
    pub images: Option<(PathBuf, PathBuf)>,
}

/// Locate every candidate abstract and strip it from the word file.
///
/// All candidates must be found; otherwise nothing is written and
/// [`RedactionOutcome::NotFound`] is returned. An image redaction failure
/// is reported in the outcome without undoing the text redaction.
pub fn redact_document(
    doc_id: &str,
    paths: &DocumentPaths,
    candidates: &[AbstractCandidate],
    config: &RedactConfig,
) -> Result<RedactionOutcome, AbscrubError> {
    let locator = SpanLocator {
        max_edit_distance: config.max_edit_distance,
        bounded_errors: config.bounded_errors,
    };
    let located = find_abstracts(&paths.word_file, candidates, &locator)?;

    let missing: Vec<String> = candidates
        .iter()
        .zip(&located)
        .filter(|(_, found)| found.is_none())
        .map(|(c, _)| c.language_tag.clone())
        .collect();
    if !missing.is_empty() {
        return Ok(RedactionOutcome::NotFound { missing });
    }
    let located: Vec<_> = located.into_iter().flatten().collect();

    let spans: Vec<_> = located.iter().map(|l| l.span).collect();
    let removed_lines = redact_text_file(
        &paths.word_file,
        &paths.output_word_file,
        &LineRanges::from_spans(&spans),
    )?;

    let image = match (&paths.images, config.redact_images) {
        (Some((input, output)), true) => {
            let pages = page_redactions(&located);
            match redact_archive(doc_id, input, output, &pages, config.fill) {
                Ok(()) => ImageOutcome::Redacted { pages: pages.len() },
                Err(e) => {
                    log::warn!("{}: image redaction failed: {}", doc_id, e);
                    ImageOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        }
        _ => ImageOutcome::NotRequested,
    };

    Ok(RedactionOutcome::Redacted {
        spans,
        removed_lines,
        image,
    })
}

/// Run one document through abstract redaction.
///
/// Never fails. Every document lands in the output: redacted when all its
/// abstracts are found, copied unchanged otherwise. Redacted ids go to the
/// success log; not-found and failed ids to the failure log. A document whose
/// image redaction failed is also logged as a failure, since its output
/// archive was not written.
pub fn process_document(
    doc_id: &str,
    record: Option<&AbstractRecord>,
    paths: &DocumentPaths,
    config: &RedactConfig,
    logs: Option<&OutcomeLogs>,
) -> RedactionOutcome {
    let outcome = match record {
        None => RedactionOutcome::NoRecord,
        Some(record) => match select_candidates(
            record,
            config.main_lang.as_deref(),
            config.min_abstract_words,
        ) {
            AbstractSelection::Ready(candidates) => {
                redact_document(doc_id, paths, &candidates, config).unwrap_or_else(|e| {
                    RedactionOutcome::Failed {
                        reason: e.to_string(),
                    }
                })
            }
            AbstractSelection::NoMainAbstract => RedactionOutcome::Skipped {
                reason: "no abstract in the main language".into(),
            },
            AbstractSelection::TooShort { words, min } => RedactionOutcome::Skipped {
                reason: format!("main abstract has {} words, minimum is {}", words, min),
            },
        },
    };

    let outcome = if matches!(outcome, RedactionOutcome::Redacted { .. }) {
        outcome
    } else {
        match copy_unchanged(paths) {
            Ok(()) => outcome,
            Err(e) => RedactionOutcome::Failed {
                reason: format!("copy failed: {}", e),
            },
        }
    };

    match &outcome {
        RedactionOutcome::Redacted { spans, .. } => {
            log::info!("{}: removed {} abstract(s)", doc_id, spans.len())
        }
        RedactionOutcome::NotFound { missing } => {
            log::info!("{}: abstract not found ({})", doc_id, missing.join(", "))
        }
        RedactionOutcome::Skipped { reason } => log::info!("{}: skipped, {}", doc_id, reason),
        RedactionOutcome::NoRecord => log::debug!("{}: no abstract record", doc_id),
        RedactionOutcome::Failed { reason } => log::warn!("{}: {}", doc_id, reason),
    }

    if let Some(logs) = logs {
        let log = match &outcome {
            RedactionOutcome::Redacted {
                image: ImageOutcome::Failed { .. },
                ..
            } => Some(&logs.failure),
            RedactionOutcome::Redacted { .. } => Some(&logs.success),
            RedactionOutcome::NotFound { .. } | RedactionOutcome::Failed { .. } => {
                Some(&logs.failure)
            }
            RedactionOutcome::Skipped { .. } | RedactionOutcome::NoRecord => None,
        };
        if let Some(log) = log {
            if let Err(e) = log.append(doc_id) {
                log::warn!("{}: cannot write {}: {}", doc_id, log.path().display(), e);
            }
        }
    }
    outcome
}

/// Copy the word file, and the image archive if present, unchanged.
fn copy_unchanged(paths: &DocumentPaths) -> Result<(), AbscrubError> {
    copy_if_distinct(&paths.word_file, &paths.output_word_file)?;
    if let Some((input, output)) = &paths.images {
        if input.is_file() {
            copy_if_distinct(input, output)?;
        }
    }
    Ok(())
}

fn copy_if_distinct(from: &Path, to: &Path) -> Result<(), AbscrubError> {
    if from != to {
        std::fs::copy(from, to)?;
    }
    Ok(())
}
