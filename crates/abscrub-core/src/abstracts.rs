use crate::error::AbscrubError;
use crate::model::AbstractCandidate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const LANG_PREFIX: &str = "abstract_";
/// Language tag given to a record's single untagged abstract.
pub const UNTAGGED: &str = "und";

/// One line of an abstracts JSONL file.
#[derive(Debug, Clone, Deserialize)]
pub struct AbstractRecord {
    pub id: String,
    /// Abstract of a single-language dataset.
    #[serde(rename = "abstract", default)]
    pub single: Option<String>,
    /// Remaining fields, among them `abstract_<lang>` entries.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl AbstractRecord {
    /// `(lang, text)` for every `abstract_<lang>` string field.
    pub fn tagged_abstracts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(key, value)| {
            let lang = key.strip_prefix(LANG_PREFIX)?;
            Some((lang, value.as_str()?))
        })
    }
}

/// What to do with a record's abstracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbstractSelection {
    /// Every candidate must be located for the document to pass.
    Ready(Vec<AbstractCandidate>),
    /// Multilingual record without an abstract in the main language.
    NoMainAbstract,
    /// The main abstract is shorter than the configured minimum.
    TooShort { words: usize, min: usize },
}

/// Pick the candidates to strip from a record.
///
/// A single `abstract` field wins. Otherwise the record needs an
/// `abstract_<main_lang>` field, and then every tagged abstract is a
/// candidate. Newlines are removed from candidate text. Secondary abstracts
/// under `min_words` are dropped; a main abstract under it skips the record.
pub fn select_candidates(
    record: &AbstractRecord,
    main_lang: Option<&str>,
    min_words: usize,
) -> AbstractSelection {
    let (main, mut candidates) = match (&record.single, main_lang) {
        (Some(text), _) => {
            let c = candidate(main_lang.unwrap_or(UNTAGGED), text);
            (c.clone(), vec![c])
        }
        (None, Some(lang)) => {
            let Some((_, text)) = record.tagged_abstracts().find(|(l, _)| *l == lang) else {
                return AbstractSelection::NoMainAbstract;
            };
            let main = candidate(lang, text);
            let all = record
                .tagged_abstracts()
                .map(|(l, t)| candidate(l, t))
                .collect::<Vec<_>>();
            (main, all)
        }
        (None, None) => return AbstractSelection::NoMainAbstract,
    };

    if min_words > 0 {
        let words = main.word_count();
        if words < min_words {
            return AbstractSelection::TooShort {
                words,
                min: min_words,
            };
        }
        candidates.retain(|c| c.language_tag == main.language_tag || c.word_count() >= min_words);
    }
    candidates.retain(|c| !c.text.trim().is_empty());

    if candidates.is_empty() {
        return AbstractSelection::NoMainAbstract;
    }
    AbstractSelection::Ready(candidates)
}

fn candidate(lang: &str, text: &str) -> AbstractCandidate {
    AbstractCandidate {
        language_tag: lang.to_string(),
        text: text.replace(['\n', '\r'], ""),
    }
}

/// Parse abstract records from JSONL, skipping blank and malformed lines.
pub fn parse_records<R: BufRead>(input: R) -> Result<Vec<AbstractRecord>, AbscrubError> {
    let mut records = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AbstractRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("skipping abstract record on line {}: {}", i + 1, e),
        }
    }
    Ok(records)
}

/// Read an abstracts JSONL file.
pub fn read_abstract_records(path: &Path) -> Result<Vec<AbstractRecord>, AbscrubError> {
    parse_records(BufReader::new(File::open(path)?))
}
