pub mod image;

use crate::error::AbscrubError;
use crate::locate::window::page_window;
use crate::locate::SpanLocator;
use crate::model::{AbstractCandidate, SpanResult};
use crate::wordfile::{self, WordRow};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Inclusive word-file line ranges to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineRanges {
    ranges: Vec<(usize, usize)>,
}

impl LineRanges {
    /// Build from inclusive `(start, stop)` pairs. Inverted pairs are reordered.
    pub fn new(ranges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut ranges: Vec<(usize, usize)> = ranges
            .into_iter()
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        ranges.sort_unstable();
        LineRanges { ranges }
    }

    pub fn from_spans<'a>(spans: impl IntoIterator<Item = &'a SpanResult>) -> Self {
        Self::new(
            spans
                .into_iter()
                .map(|s| (s.start_word_idx, s.end_word_idx)),
        )
    }

    pub fn contains(&self, line: usize) -> bool {
        self.ranges
            .iter()
            .any(|&(start, stop)| start <= line && line <= stop)
    }
}

/// Copy `input` to `out`, dropping every line whose 0-based index is in `ranges`.
///
/// Kept lines are written byte for byte, including a missing final newline.
/// Returns the number of removed lines.
pub fn redact_lines<R: BufRead, W: Write>(
    mut input: R,
    out: &mut W,
    ranges: &LineRanges,
) -> std::io::Result<usize> {
    let mut lines: Vec<Vec<u8>> = Vec::new();
    loop {
        let mut line = Vec::new();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        lines.push(line);
    }

    let mut removed = 0;
    for (i, line) in lines.iter().enumerate() {
        if ranges.contains(i) {
            removed += 1;
        } else {
            out.write_all(line)?;
        }
    }
    Ok(removed)
}

/// Write a filtered copy of a word file.
///
/// The copy is staged next to `output` and moved into place once complete,
/// so `output` may equal `input`.
pub fn redact_text_file(
    input: &Path,
    output: &Path,
    ranges: &LineRanges,
) -> Result<usize, AbscrubError> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    let reader = BufReader::new(File::open(input)?);
    let removed = {
        let mut writer = BufWriter::new(staged.as_file_mut());
        let removed = redact_lines(reader, &mut writer, ranges)?;
        writer.flush()?;
        removed
    };
    staged.persist(output).map_err(|e| e.error)?;
    Ok(removed)
}

/// An abstract found in a word file, with the rows of its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedAbstract {
    pub language_tag: String,
    pub span: SpanResult,
    /// Word-file line index of the page's first row.
    pub page_offset: usize,
    pub page_rows: Vec<WordRow>,
}

impl LocatedAbstract {
    /// Rows covered by the span.
    pub fn span_rows(&self) -> &[WordRow] {
        let start = self.span.start_word_idx - self.page_offset;
        let end = (self.span.end_word_idx - self.page_offset + 1).min(self.page_rows.len());
        &self.page_rows[start.min(end)..end]
    }
}

/// Search a word file for every candidate, page by page.
///
/// Only pages in the page window are searched, then the final page as a
/// fallback. A candidate keeps the first page it matches on, in page order.
/// Scanning stops as soon as every candidate is found. A match covering
/// every word of a one-page document is rejected. The result lines up with
/// `candidates`; `None` means not found.
pub fn find_abstracts(
    word_file: &Path,
    candidates: &[AbstractCandidate],
    locator: &SpanLocator,
) -> Result<Vec<Option<LocatedAbstract>>, AbscrubError> {
    let page_count = wordfile::count_pages(word_file)?;
    let window = page_window(page_count);
    let mut search = PageSearch {
        single_page: page_count <= 1,
        needles: candidates.iter().map(|c| c.text.to_lowercase()).collect(),
        candidates,
        locator,
        found: vec![None; candidates.len()],
    };

    let reader = BufReader::new(File::open(word_file)?);
    let mut page: Vec<WordRow> = Vec::new();
    let mut page_number = 0;
    let mut offset = 0;

    for (i, row) in wordfile::rows(reader).enumerate() {
        let row = row?;
        if row.page_number != page_number && !page.is_empty() {
            if window.contains(&page_number) {
                search.run(&page, page_number, offset);
                if search.all_found() {
                    return Ok(search.found);
                }
            }
            page.clear();
            offset = i;
        }
        page_number = row.page_number;
        page.push(row);
    }

    if !page.is_empty() {
        search.run(&page, page_number, offset);
    }
    Ok(search.found)
}

struct PageSearch<'a> {
    single_page: bool,
    candidates: &'a [AbstractCandidate],
    needles: Vec<String>,
    locator: &'a SpanLocator,
    found: Vec<Option<LocatedAbstract>>,
}

impl PageSearch<'_> {
    fn all_found(&self) -> bool {
        self.found.iter().all(Option::is_some)
    }

    fn run(&mut self, page: &[WordRow], page_number: usize, offset: usize) {
        let text = page
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        for (idx, needle) in self.needles.iter().enumerate() {
            if self.found[idx].is_some() {
                continue;
            }
            let Some((start, end)) = self.locator.locate(&text, needle) else {
                continue;
            };
            let lang = &self.candidates[idx].language_tag;
            if self.single_page && start == 0 && end + 1 >= page.len() {
                log::debug!("abstract [{}] spans the whole document, rejected", lang);
                continue;
            }
            log::debug!(
                "abstract [{}] found on page {}, words {}..={}",
                lang,
                page_number,
                start + offset,
                end + offset
            );
            self.found[idx] = Some(LocatedAbstract {
                language_tag: lang.clone(),
                span: SpanResult {
                    start_word_idx: start + offset,
                    end_word_idx: end + offset,
                    page_number,
                },
                page_offset: offset,
                page_rows: page.to_vec(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "a\nb\nc\nd\ne";

    fn redact(ranges: &[(usize, usize)]) -> String {
        let mut out = Vec::new();
        redact_lines(FILE.as_bytes(), &mut out, &LineRanges::new(ranges.iter().copied())).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_ranges_identity() {
        assert_eq!(redact(&[]), FILE);
    }

    #[test]
    fn test_range_bounds_inclusive() {
        assert_eq!(redact(&[(1, 2)]), "a\nd\ne");
        assert_eq!(redact(&[(0, 0)]), "b\nc\nd\ne");
        assert_eq!(redact(&[(4, 4)]), "a\nb\nc\nd\n");
    }

    #[test]
    fn test_multiple_and_overlapping_ranges() {
        assert_eq!(redact(&[(3, 4), (0, 0)]), "b\nc\n");
        assert_eq!(redact(&[(1, 3), (2, 2)]), "a\ne");
    }

    #[test]
    fn test_removed_count() {
        let mut out = Vec::new();
        let n = redact_lines(FILE.as_bytes(), &mut out, &LineRanges::new([(1, 3)])).unwrap();
        assert_eq!(n, 3);
    }

    fn word_file(pages: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for (i, text) in pages.iter().enumerate() {
            for (j, w) in text.split_whitespace().enumerate() {
                writeln!(f, "{}\t{}\t0\t{}\t10\t600\t800\t{}", w, j * 10, j * 10 + 8, i + 1).unwrap();
            }
        }
        f.flush().unwrap();
        f
    }

    fn candidate(text: &str) -> AbstractCandidate {
        AbstractCandidate {
            language_tag: "en".into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_find_abstract_global_indices() {
        let f = word_file(&["Hello World", "Abstract text here"]);
        let found = find_abstracts(f.path(), &[candidate("Abstract text here")], &SpanLocator::default())
            .unwrap();
        let located = found[0].as_ref().unwrap();
        assert_eq!(
            located.span,
            SpanResult {
                start_word_idx: 2,
                end_word_idx: 4,
                page_number: 2
            }
        );
        assert_eq!(located.span_rows().len(), 3);
        assert_eq!(located.span_rows()[0].text, "Abstract");
    }

    #[test]
    fn test_first_page_in_scan_order_wins() {
        let f = word_file(&["intro we study noise end", "again we study noise end"]);
        let found = find_abstracts(f.path(), &[candidate("we study noise")], &SpanLocator::default())
            .unwrap();
        assert_eq!(found[0].as_ref().unwrap().span.page_number, 1);
    }

    #[test]
    fn test_body_pages_not_searched() {
        let f = word_file(&[
            "p1 x",
            "p2 x",
            "body has the summary of a long abstract text here",
            "p4 x",
            "p5 x",
            "p6 x",
        ]);
        let needle = candidate("the summary of a long abstract text");
        let found = find_abstracts(f.path(), &[needle], &SpanLocator::default()).unwrap();
        assert!(found[0].is_none());
    }

    #[test]
    fn test_each_candidate_located_independently() {
        let f = word_file(&["resumen en castellano fin", "p2 x", "p3 x", "summary in english fin"]);
        let candidates = [candidate("resumen en castellano"), candidate("summary in english")];
        let locator = SpanLocator {
            max_edit_distance: 2,
            bounded_errors: 2,
        };
        let found = find_abstracts(f.path(), &candidates, &locator).unwrap();
        assert_eq!(found[0].as_ref().unwrap().span.page_number, 1);
        assert_eq!(found[1].as_ref().unwrap().span.page_number, 4);
        assert_eq!(found[1].as_ref().unwrap().span.start_word_idx, 8);
    }

    #[test]
    fn test_whole_document_match_rejected() {
        let f = word_file(&["abstract text here"]);
        let found = find_abstracts(f.path(), &[candidate("abstract text here")], &SpanLocator::default())
            .unwrap();
        assert!(found[0].is_none());
    }

    #[test]
    fn test_redact_text_file_in_place() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", FILE).unwrap();
        f.flush().unwrap();

        let removed = redact_text_file(f.path(), f.path(), &LineRanges::new([(1, 3)])).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(std::fs::read_to_string(f.path()).unwrap(), "a\ne");
    }

    #[test]
    fn test_line_ranges_reorders_inverted() {
        let r = LineRanges::new([(5, 2)]);
        assert!(r.contains(2));
        assert!(r.contains(5));
        assert!(!r.contains(6));
    }
}
