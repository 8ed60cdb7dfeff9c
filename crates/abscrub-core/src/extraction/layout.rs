use crate::error::AbscrubError;
use crate::model::{BBox, Page, WordRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::io::BufRead;

/// Streaming reader over `pdftotext -bbox` style markup.
///
/// Yields one sealed [`Page`] at a time. Only the page being built is held in
/// memory. Pages without any word are never sealed, so page numbers count
/// text-bearing pages in arrival order.
///
/// pdftotext writes one element per line, so markup is parsed a line at a
/// time. A malformed line is logged and skipped without affecting the lines
/// after it; only a failing byte source ends the stream with an error.
pub struct PageStream<R: BufRead> {
    input: R,
    line: Vec<u8>,
    line_number: usize,
    page: PageAccumulator,
    word: Option<PendingWord>,
    sealed: VecDeque<Page>,
    done: bool,
}

/// The page currently being filled.
#[derive(Debug, Default)]
struct PageAccumulator {
    width: u32,
    height: u32,
    words: Vec<WordRecord>,
}

#[derive(Debug)]
struct PendingWord {
    coords: Option<(f64, f64, f64, f64)>,
    text: String,
}

impl PageAccumulator {
    /// Begin a new page, returning the previous one if it holds words.
    fn start_page(&mut self, width: u32, height: u32) -> Option<Page> {
        let sealed = self.seal();
        self.width = width;
        self.height = height;
        sealed
    }

    fn push_word(&mut self, raw_text: &str, (x_min, y_min, x_max, y_max): (f64, f64, f64, f64)) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let text = clean_word(raw_text);
        if text.is_empty() {
            return;
        }

        let rounded = (
            round_coord(x_min),
            round_coord(y_min),
            round_coord(x_max),
            round_coord(y_max),
        );
        self.words.push(WordRecord {
            text,
            bbox: BBox::clamped(rounded, self.width, self.height),
            page_width: self.width,
            page_height: self.height,
        });
    }

    fn seal(&mut self) -> Option<Page> {
        if self.words.is_empty() {
            return None;
        }
        Some(Page {
            width: self.width,
            height: self.height,
            words: std::mem::take(&mut self.words),
        })
    }
}

impl<R: BufRead> PageStream<R> {
    pub fn new(input: R) -> Self {
        PageStream {
            input,
            line: Vec::new(),
            line_number: 0,
            page: PageAccumulator::default(),
            word: None,
            sealed: VecDeque::new(),
            done: false,
        }
    }

    /// Run every event of one markup line through the page state.
    fn feed_line(&mut self, line: &[u8]) {
        let mut reader = Reader::from_reader(line);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(event) => self.on_event(event),
                Err(e) => {
                    log::warn!("skipping malformed markup on line {}: {}", self.line_number, e);
                    self.word = None;
                    break;
                }
            }
        }
    }

    fn on_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(e) => self.on_start(&e, false),
            Event::Empty(e) => self.on_start(&e, true),
            Event::Text(t) => {
                if let Some(word) = self.word.as_mut() {
                    match t.unescape() {
                        Ok(s) => word.text.push_str(&s),
                        Err(_) => word.text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Event::CData(c) => {
                if let Some(word) = self.word.as_mut() {
                    word.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"word" => self.on_end_word(),
            _ => {}
        }
    }

    fn on_start(&mut self, e: &BytesStart<'_>, is_empty: bool) {
        match e.local_name().as_ref() {
            b"page" => {
                let Some((width, height)) = page_size(e) else {
                    return;
                };
                self.word = None;
                if let Some(page) = self.page.start_page(width, height) {
                    self.sealed.push_back(page);
                }
            }
            b"word" if !is_empty => {
                self.word = Some(PendingWord {
                    coords: word_coords(e),
                    text: String::new(),
                });
            }
            _ => {}
        }
    }

    fn on_end_word(&mut self) {
        if let Some(word) = self.word.take() {
            match word.coords {
                Some(coords) => self.page.push_word(&word.text, coords),
                None => log::debug!("word '{}' without position attributes skipped", word.text),
            }
        }
    }
}

impl<R: BufRead> Iterator for PageStream<R> {
    type Item = Result<Page, AbscrubError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(page) = self.sealed.pop_front() {
                return Some(Ok(page));
            }
            if self.done {
                return None;
            }

            let mut line = std::mem::take(&mut self.line);
            line.clear();
            match self.input.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.done = true;
                    if let Some(page) = self.page.seal() {
                        self.sealed.push_back(page);
                    }
                }
                Ok(_) => {
                    self.line_number += 1;
                    self.feed_line(&line);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(AbscrubError::Xml(e.to_string())));
                }
            }
            self.line = line;
        }
    }
}

/// Strip every whitespace character and map the typographic apostrophe to `'`.
pub fn clean_word(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .collect()
}

fn round_coord(v: f64) -> i64 {
    v.round_ties_even() as i64
}

fn page_size(e: &BytesStart<'_>) -> Option<(u32, u32)> {
    let width = attr_f64(e, b"width")?;
    let height = attr_f64(e, b"height")?;
    Some((
        width.round_ties_even().max(0.0) as u32,
        height.round_ties_even().max(0.0) as u32,
    ))
}

fn word_coords(e: &BytesStart<'_>) -> Option<(f64, f64, f64, f64)> {
    Some((
        attr_f64(e, b"xMin")?,
        attr_f64(e, b"yMin")?,
        attr_f64(e, b"xMax")?,
        attr_f64(e, b"yMax")?,
    ))
}

fn attr_f64(e: &BytesStart<'_>, name: &[u8]) -> Option<f64> {
    let mut attrs = e.attributes();
    attrs.with_checks(false);
    attrs
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok()?.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
