use crate::model::{Document, WordRecord};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Reference/bibliography section headings, by language tag.
static REFERENCE_HEADINGS: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("de", &["bibliografie", "literatur", "referenzen"]);
        m.insert("en", &["references", "bibliography"]);
        m.insert("es", &["referencias", "bibliografía"]);
        m.insert("fr", &["bibliographie", "références"]);
        m.insert("it", &["bibliografia"]);
        m.insert("pt", &["referências", "bibliografia"]);
        m.insert("ru", &["литература"]);
        m
    });

/// Position of a reference heading: 0-based page index and word index in that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingPosition {
    pub page_idx: usize,
    pub word_idx: usize,
}

/// Headings for a language. Unknown or missing languages match every table entry.
pub fn headings_for(lang: Option<&str>) -> Vec<&'static str> {
    match lang.and_then(|l| REFERENCE_HEADINGS.get(l.to_lowercase().as_str())) {
        Some(words) => words.to_vec(),
        None => {
            let mut all: Vec<&'static str> =
                REFERENCE_HEADINGS.values().flat_map(|w| w.iter().copied()).collect();
            all.sort_unstable();
            all.dedup();
            all
        }
    }
}

/// Find the last reference heading in the document.
///
/// A word counts as a heading when, stripped of punctuation and lowercased,
/// it equals a keyword and it opens a line, possibly after a section number
/// such as `7.` or `IV`.
pub fn locate_reference_heading(doc: &Document, lang: Option<&str>) -> Option<HeadingPosition> {
    let headings = headings_for(lang);

    for (page_idx, page) in doc.pages.iter().enumerate().rev() {
        for word_idx in (0..page.words.len()).rev() {
            let word = &page.words[word_idx];
            if !is_heading_word(&word.text, &headings) {
                continue;
            }
            let prev = word_idx.checked_sub(1).map(|i| &page.words[i]);
            let numbered = match word_idx.checked_sub(1) {
                Some(i) if is_section_number(&page.words[i].text) => {
                    let before = i.checked_sub(1).map(|j| &page.words[j]);
                    starts_line(&page.words[i], before)
                }
                _ => false,
            };
            if numbered || starts_line(word, prev) {
                return Some(HeadingPosition { page_idx, word_idx });
            }
        }
    }

    None
}

/// Drop everything from the heading onwards.
///
/// Pages after the heading page go; the heading page keeps the words before
/// the heading and is removed if that leaves it empty.
pub fn truncate_at_heading(doc: &mut Document, at: HeadingPosition) {
    if at.page_idx >= doc.pages.len() {
        return;
    }
    doc.pages.truncate(at.page_idx + 1);
    doc.pages[at.page_idx].words.truncate(at.word_idx);
    if doc.pages[at.page_idx].is_empty() {
        doc.pages.pop();
    }
}

fn is_heading_word(text: &str, headings: &[&str]) -> bool {
    let core = text.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase();
    !core.is_empty() && headings.contains(&core.as_str())
}

fn is_section_number(text: &str) -> bool {
    let core = text.trim_end_matches(['.', ')', ':']);
    !core.is_empty()
        && (core.chars().all(|c| c.is_ascii_digit() || c == '.')
            || core.chars().all(|c| matches!(c, 'I' | 'V' | 'X' | 'L')))
}

fn starts_line(word: &WordRecord, prev: Option<&WordRecord>) -> bool {
    match prev {
        None => true,
        Some(p) => word.bbox.x_min <= p.bbox.x_min || word.bbox.y_min >= p.bbox.y_max,
    }
}
