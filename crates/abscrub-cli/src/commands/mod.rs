pub mod extract;
pub mod pages;
pub mod redact;

use abscrub_core::error::AbscrubError;
use abscrub_core::outcome::read_id_list;
use clap::Args;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Options shared by the batch commands.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Process at most N documents
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Skip documents already listed in the outcome logs
    #[arg(long, conflicts_with = "overwrite")]
    pub resume: bool,

    /// Clear the output directories and outcome logs first
    #[arg(long)]
    pub overwrite: bool,

    /// Worker threads (default: available cores, at most 8)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

/// Get output directories and logs ready, returning the ids to skip.
///
/// An output directory that is also an input is always an error. A non-empty
/// output directory is an error unless resuming or overwriting.
pub fn prepare_batch(
    batch: &BatchArgs,
    inputs: &[&Path],
    outputs: &[&Path],
    logs: &[&Path],
) -> Result<BTreeSet<String>, AbscrubError> {
    for &dir in outputs {
        if inputs.iter().any(|&input| same_dir(input, dir)) {
            return Err(AbscrubError::ConfigInvalid(format!(
                "output directory {} is also an input directory",
                dir.display()
            )));
        }
    }

    for &dir in outputs {
        if is_non_empty_dir(dir)? && !batch.resume {
            if !batch.overwrite {
                return Err(AbscrubError::OutputNotEmpty(dir.to_path_buf()));
            }
            log::info!("clearing {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
    }

    if batch.overwrite {
        for &log in logs {
            if log.exists() {
                fs::remove_file(log)?;
            }
        }
    }

    let mut done = BTreeSet::new();
    if batch.resume {
        for &log in logs {
            done.extend(read_id_list(log)?);
        }
        log::info!("resuming, {} documents already processed", done.len());
    }
    Ok(done)
}

/// Documents in `dir` with one of `extensions`, as `(id, path)` sorted by id.
pub fn list_documents(dir: &Path, extensions: &[&str]) -> Result<Vec<(String, PathBuf)>, AbscrubError> {
    let mut docs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.contains(&e));
        if !matches || !path.is_file() {
            continue;
        }
        if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
            docs.push((id.to_string(), path.clone()));
        }
    }
    docs.sort();
    Ok(docs)
}

/// Drop already processed documents, then apply the limit.
pub fn select_work(
    docs: Vec<(String, PathBuf)>,
    done: &BTreeSet<String>,
    limit: Option<usize>,
) -> Vec<(String, PathBuf)> {
    docs.into_iter()
        .filter(|(id, _)| !done.contains(id))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

fn is_non_empty_dir(dir: &Path) -> Result<bool, AbscrubError> {
    if !dir.is_dir() {
        return Ok(false);
    }
    Ok(fs::read_dir(dir)?.next().is_some())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
