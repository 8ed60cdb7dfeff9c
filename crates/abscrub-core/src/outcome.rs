use crate::error::AbscrubError;
use crate::model::SpanResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Result of converting one document's layout markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// A word file was written.
    Parsed { pages: usize, words: usize },
    /// No page carried text (scanned or empty source).
    NoContent,
    /// The markup could not be read.
    Failed { reason: String },
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Parsed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtractionOutcome::Parsed { .. } => "parsed",
            ExtractionOutcome::NoContent => "no_content",
            ExtractionOutcome::Failed { .. } => "failed",
        }
    }
}

/// Result of stripping abstracts from one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RedactionOutcome {
    /// Every candidate was located and its lines removed.
    Redacted {
        spans: Vec<SpanResult>,
        removed_lines: usize,
        image: ImageOutcome,
    },
    /// At least one candidate was not located; the word file was copied unchanged.
    NotFound { missing: Vec<String> },
    /// The record is not applicable; the word file was copied unchanged.
    Skipped { reason: String },
    /// No abstract record exists for the document; the word file was copied unchanged.
    NoRecord,
    /// Reading or writing the document failed.
    Failed { reason: String },
}

impl RedactionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RedactionOutcome::Redacted { .. } => "redacted",
            RedactionOutcome::NotFound { .. } => "not_found",
            RedactionOutcome::Skipped { .. } => "skipped",
            RedactionOutcome::NoRecord => "no_record",
            RedactionOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    NotRequested,
    Redacted { pages: usize },
    /// No archive was written to the output; text redaction still stands.
    Failed { reason: String },
}

/// Append-only list of document ids, one per line.
///
/// Safe to share between worker threads.
#[derive(Debug)]
pub struct OutcomeLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl OutcomeLog {
    /// Open for appending, creating the file if needed.
    pub fn open(path: &Path) -> Result<Self, AbscrubError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(OutcomeLog {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn append(&self, id: &str) -> Result<(), AbscrubError> {
        let mut file = self.file.lock().unwrap_or_else(|p| p.into_inner());
        writeln!(file, "{}", id)?;
        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Success and failure logs of one stage.
#[derive(Debug)]
pub struct OutcomeLogs {
    pub success: OutcomeLog,
    pub failure: OutcomeLog,
}

impl OutcomeLogs {
    pub fn open(success: &Path, failure: &Path) -> Result<Self, AbscrubError> {
        Ok(OutcomeLogs {
            success: OutcomeLog::open(success)?,
            failure: OutcomeLog::open(failure)?,
        })
    }
}

/// Ids listed in a log file. A missing file is an empty list.
pub fn read_id_list(path: &Path) -> Result<BTreeSet<String>, AbscrubError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e.into()),
    };
    let mut ids = BTreeSet::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}
