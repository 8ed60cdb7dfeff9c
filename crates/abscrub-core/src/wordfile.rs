//! Tab-separated word file: one word per line,
//! `word xmin ymin xmax ymax page_width page_height page_number`.

use crate::error::AbscrubError;
use crate::model::{BBox, Document, Page, WordRecord};
use std::fs::File;
use std::io::{BufRead, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

const FIELD_COUNT: usize = 8;

/// One parsed word file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRow {
    pub text: String,
    pub bbox: BBox,
    pub page_width: u32,
    pub page_height: u32,
    pub page_number: usize,
}

impl WordRow {
    pub fn into_record(self) -> WordRecord {
        WordRecord {
            text: self.text,
            bbox: self.bbox,
            page_width: self.page_width,
            page_height: self.page_height,
        }
    }
}

/// Render one word record as a line (without the trailing newline).
pub fn format_row(word: &WordRecord, page_number: usize) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        word.text, word.bbox, word.page_width, word.page_height, page_number
    )
}

/// Write a document in word file format.
pub fn write_document<W: Write>(doc: &Document, out: &mut W) -> std::io::Result<()> {
    for (page_number, page) in doc.numbered_pages() {
        for word in &page.words {
            writeln!(out, "{}", format_row(word, page_number))?;
        }
    }
    Ok(())
}

/// Write a document to a file, replacing it.
pub fn save_document(doc: &Document, path: &Path) -> Result<(), AbscrubError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_document(doc, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Parse one line. `line_no` is 1-based and only used for error messages.
pub fn parse_row(line: &str, line_no: usize) -> Result<WordRow, AbscrubError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != FIELD_COUNT {
        return Err(AbscrubError::WordFile {
            line: line_no,
            reason: format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        });
    }

    let num = |idx: usize| -> Result<u32, AbscrubError> {
        fields[idx]
            .trim()
            .parse::<u32>()
            .map_err(|e| AbscrubError::WordFile {
                line: line_no,
                reason: format!("field {} '{}': {}", idx, fields[idx], e),
            })
    };

    let page_number = fields[FIELD_COUNT - 1]
        .trim()
        .parse::<usize>()
        .map_err(|e| AbscrubError::WordFile {
            line: line_no,
            reason: format!("page number '{}': {}", fields[FIELD_COUNT - 1], e),
        })?;

    Ok(WordRow {
        text: fields[0].to_string(),
        bbox: BBox {
            x_min: num(1)?,
            y_min: num(2)?,
            x_max: num(3)?,
            y_max: num(4)?,
        },
        page_width: num(5)?,
        page_height: num(6)?,
        page_number,
    })
}

/// Lazily parse rows from a reader.
pub fn rows<R: BufRead>(input: R) -> impl Iterator<Item = Result<WordRow, AbscrubError>> {
    input.lines().enumerate().map(|(i, line)| {
        let line = line?;
        parse_row(&line, i + 1)
    })
}

/// Rebuild a [`Document`] from word file rows, grouping consecutive rows by page number.
pub fn read_document<R: BufRead>(input: R) -> Result<Document, AbscrubError> {
    let mut doc = Document::default();
    let mut current: Option<(usize, Page)> = None;

    for row in rows(input) {
        let row = row?;
        match current.as_mut() {
            Some((number, page)) if *number == row.page_number => {
                page.words.push(row.into_record());
            }
            _ => {
                if let Some((_, page)) = current.take() {
                    doc.pages.push(page);
                }
                let mut page = Page::new(row.page_width, row.page_height);
                let number = row.page_number;
                page.words.push(row.into_record());
                current = Some((number, page));
            }
        }
    }
    if let Some((_, page)) = current {
        doc.pages.push(page);
    }

    Ok(doc)
}

/// Total page count of a word file, read from its final line only.
///
/// Returns 0 for an empty file.
pub fn count_pages(path: &Path) -> Result<usize, AbscrubError> {
    let mut file = File::open(path)?;
    let line = last_line(&mut file)?;
    if line.trim().is_empty() {
        return Ok(0);
    }
    let row = parse_row(&line, 0)?;
    Ok(row.page_number)
}

/// Read the last non-empty line by scanning backwards from the end.
fn last_line<F: Read + Seek>(file: &mut F) -> std::io::Result<String> {
    const CHUNK: u64 = 4096;

    let len = file.seek(SeekFrom::End(0))?;
    let mut tail: Vec<u8> = Vec::new();
    let mut pos = len;

    while pos > 0 {
        let step = CHUNK.min(pos);
        pos -= step;
        file.seek(SeekFrom::Start(pos))?;
        let mut chunk = vec![0u8; step as usize];
        file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&tail);
        tail = chunk;

        let trimmed_len = tail
            .iter()
            .rposition(|b| *b != b'\n' && *b != b'\r')
            .map_or(0, |i| i + 1);
        if let Some(nl) = tail[..trimmed_len].iter().rposition(|b| *b == b'\n') {
            return Ok(String::from_utf8_lossy(&tail[nl + 1..trimmed_len]).into_owned());
        }
    }

    let trimmed_len = tail
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |i| i + 1);
    Ok(String::from_utf8_lossy(&tail[..trimmed_len]).into_owned())
}
