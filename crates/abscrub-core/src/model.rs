use serde::{Deserialize, Serialize};
use std::fmt;

/// Word bounding box in integer page units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl BBox {
    /// Build a box from rounded source coordinates, clamping it into
    /// `[0, page_width] x [0, page_height]` and swapping inverted edges.
    pub fn clamped(
        (x_min, y_min, x_max, y_max): (i64, i64, i64, i64),
        page_width: u32,
        page_height: u32,
    ) -> BBox {
        let clamp_x = |v: i64| v.clamp(0, page_width as i64) as u32;
        let clamp_y = |v: i64| v.clamp(0, page_height as i64) as u32;

        let (mut x0, mut x1) = (clamp_x(x_min), clamp_x(x_max));
        let (mut y0, mut y1) = (clamp_y(y_min), clamp_y(y_max));
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
        }
        if y0 > y1 {
            std::mem::swap(&mut y0, &mut y1);
        }

        BBox {
            x_min: x0,
            y_min: y0,
            x_max: x1,
            y_max: y1,
        }
    }

    /// Rescale into the 0..=1000 layout-model coordinate space.
    /// Each coordinate is rounded down independently.
    pub fn normalized(&self, page_width: u32, page_height: u32) -> BBox {
        let scale = |v: u32, size: u32| ((1000 * v as u64) / size.max(1) as u64) as u32;
        BBox {
            x_min: scale(self.x_min, page_width),
            y_min: scale(self.y_min, page_height),
            x_max: scale(self.x_max, page_width),
            y_max: scale(self.y_max, page_height),
        }
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// One positioned word of extracted layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub text: String,
    pub bbox: BBox,
    pub page_width: u32,
    pub page_height: u32,
}

/// Words of one page, in reading order, sharing one page size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub width: u32,
    pub height: u32,
    pub words: Vec<WordRecord>,
}

impl Page {
    pub fn new(width: u32, height: u32) -> Self {
        Page {
            width,
            height,
            words: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word texts joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Ordered pages of one source file. Page numbers are 1-based positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|p| p.words.len()).sum()
    }

    /// True when no page carries a word (scanned or image-only source).
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.is_empty())
    }

    /// Iterate `(page_number, page)` with 1-based numbers.
    pub fn numbered_pages(&self) -> impl Iterator<Item = (usize, &Page)> {
        self.pages.iter().enumerate().map(|(i, p)| (i + 1, p))
    }
}

/// An abstract to strip, tagged with its language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractCandidate {
    pub language_tag: String,
    pub text: String,
}

impl AbstractCandidate {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A located abstract: inclusive word-file line range plus the page it sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanResult {
    pub start_word_idx: usize,
    pub end_word_idx: usize,
    pub page_number: usize,
}

impl SpanResult {
    pub fn contains(&self, idx: usize) -> bool {
        self.start_word_idx <= idx && idx <= self.end_word_idx
    }

    pub fn word_count(&self) -> usize {
        self.end_word_idx - self.start_word_idx + 1
    }
}
