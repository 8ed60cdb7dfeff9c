pub mod fuzzy;
pub mod window;

use fuzzy::{find_best_near_match, find_leftmost_near_match};

/// Default edit budget of the fuzzy tier.
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 15;
/// Default edit budget of the bounded-error fallback tier.
pub const DEFAULT_BOUNDED_ERRORS: usize = 5;

/// Which search tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Fuzzy,
    Bounded,
}

/// A matched character range (char indices, end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
    pub tier: MatchTier,
}

/// Finds an abstract inside a page's text and maps it to word indices.
#[derive(Debug, Clone, Copy)]
pub struct SpanLocator {
    pub max_edit_distance: usize,
    pub bounded_errors: usize,
}

impl Default for SpanLocator {
    fn default() -> Self {
        SpanLocator {
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            bounded_errors: DEFAULT_BOUNDED_ERRORS,
        }
    }
}

impl SpanLocator {
    pub fn new(max_edit_distance: usize) -> Self {
        SpanLocator {
            max_edit_distance,
            ..Default::default()
        }
    }

    /// Character span of `needle` in `haystack`, trying exact, fuzzy, then
    /// bounded-error search. The first tier that matches wins.
    pub fn find_char_span(&self, haystack: &str, needle: &str) -> Option<CharSpan> {
        if needle.is_empty() || haystack.is_empty() {
            return None;
        }

        if let Some(byte_start) = haystack.find(needle) {
            let start = haystack[..byte_start].chars().count();
            let end = start + needle.chars().count();
            log::debug!("exact match at chars {}..{}", start, end);
            return Some(CharSpan {
                start,
                end,
                tier: MatchTier::Exact,
            });
        }

        let hay: Vec<char> = haystack.chars().collect();
        let pat: Vec<char> = needle.chars().collect();

        if let Some(m) = find_best_near_match(&pat, &hay, self.max_edit_distance) {
            log::debug!(
                "fuzzy match at chars {}..{} ({} edits)",
                m.start,
                m.end,
                m.distance
            );
            return Some(CharSpan {
                start: m.start,
                end: m.end,
                tier: MatchTier::Fuzzy,
            });
        }

        // A miss under the larger fuzzy budget rules out any bounded match.
        let fuzzy_budget = self.max_edit_distance.min(pat.len().saturating_sub(1));
        if self.bounded_errors <= fuzzy_budget {
            return None;
        }

        find_leftmost_near_match(&pat, &hay, self.bounded_errors).map(|m| {
            log::debug!(
                "bounded match at chars {}..{} ({} edits)",
                m.start,
                m.end,
                m.distance
            );
            CharSpan {
                start: m.start,
                end: m.end,
                tier: MatchTier::Bounded,
            }
        })
    }

    /// Inclusive page-local word range of `needle` in `haystack`.
    ///
    /// Both strings are expected lowercased, with the haystack being the
    /// page's words joined by spaces.
    pub fn locate(&self, haystack: &str, needle: &str) -> Option<(usize, usize)> {
        let span = self.find_char_span(haystack, needle)?;
        let hay: Vec<char> = haystack.chars().collect();
        let range = span_to_word_range(&hay, span.start, span.end);
        if range.is_none() {
            log::debug!("rejected {:?} match touching no word", span.tier);
        }
        range
    }
}

/// Locate with the default bounded-error budget.
pub fn locate(haystack: &str, needle: &str, max_edit_distance: usize) -> Option<(usize, usize)> {
    SpanLocator::new(max_edit_distance).locate(haystack, needle)
}

/// Map a char span to the inclusive range of words it touches.
///
/// Words are counted before and inside the span. A span that begins inside
/// a word shares that word with the words before it. A span touching no
/// word yields `None`.
pub fn span_to_word_range(hay: &[char], start: usize, end: usize) -> Option<(usize, usize)> {
    let start = start.min(hay.len());
    let end = end.clamp(start, hay.len());

    let before = count_words(&hay[..start]);
    let inside = count_words(&hay[start..end]);
    if inside == 0 {
        return None;
    }

    let splits_word = start > 0
        && start < hay.len()
        && !hay[start - 1].is_whitespace()
        && !hay[start].is_whitespace();
    let first = if splits_word { before - 1 } else { before };
    Some((first, first + inside - 1))
}

fn count_words(chars: &[char]) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for c in chars {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            count += 1;
        }
    }
    count
}
