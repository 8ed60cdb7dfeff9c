//! Approximate substring search under Levenshtein distance.
//!
//! All positions are char indices into the haystack slice.

/// An approximate occurrence: `hay[start..end]` is within `distance` edits of the needle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearMatch {
    pub start: usize,
    pub end: usize,
    pub distance: usize,
}

/// Best approximate occurrence in the first cluster of occurrences.
///
/// Scans for the first end position within `max_dist` edits, then takes the
/// lowest-distance end among the overlapping candidates that follow it.
pub fn find_best_near_match(needle: &[char], hay: &[char], max_dist: usize) -> Option<NearMatch> {
    let m = needle.len();
    if m == 0 || hay.is_empty() {
        return None;
    }
    let max_dist = max_dist.min(m - 1);

    let ends = distances(needle, hay, true);
    let first = ends.iter().position(|&d| d <= max_dist)?;
    let window_end = (first + m + max_dist).min(hay.len());

    let (end, distance) = (first..=window_end)
        .map(|j| (j, ends[j]))
        .filter(|&(_, d)| d <= max_dist)
        .min_by_key(|&(j, d)| (d, j))?;

    let start = best_start(needle, hay, end, max_dist);
    Some(NearMatch {
        start,
        end,
        distance,
    })
}

/// Leftmost approximate occurrence within `max_errors` edits.
///
/// Leading insertions are trimmed: among starts up to `max_errors` chars
/// right of the leftmost one, the lowest-distance start wins.
pub fn find_leftmost_near_match(
    needle: &[char],
    hay: &[char],
    max_errors: usize,
) -> Option<NearMatch> {
    let m = needle.len();
    let n = hay.len();
    if m == 0 || n == 0 {
        return None;
    }
    let max_errors = max_errors.min(m - 1);

    let rev_needle: Vec<char> = needle.iter().rev().copied().collect();
    let rev_hay: Vec<char> = hay.iter().rev().copied().collect();
    let rev_ends = distances(&rev_needle, &rev_hay, true);
    // Distance of the best occurrence starting at `s`.
    let start_dist = |s: usize| rev_ends[n - s];

    let leftmost = (0..=n).find(|&s| start_dist(s) <= max_errors)?;
    let start = (leftmost..=(leftmost + max_errors).min(n))
        .min_by_key(|&s| (start_dist(s), s))
        .unwrap_or(leftmost);

    let seg_end = (start + m + max_errors).min(n);
    let lengths = distances(needle, &hay[start..seg_end], false);
    let (len, distance) = pick_length(&lengths, m)?;
    if distance > max_errors {
        return None;
    }

    Some(NearMatch {
        start,
        end: start + len,
        distance,
    })
}

/// Start of the best occurrence ending at `end`.
fn best_start(needle: &[char], hay: &[char], end: usize, max_dist: usize) -> usize {
    let lo = end.saturating_sub(needle.len() + max_dist);
    let rev_needle: Vec<char> = needle.iter().rev().copied().collect();
    let rev_seg: Vec<char> = hay[lo..end].iter().rev().copied().collect();
    let lengths = distances(&rev_needle, &rev_seg, false);
    match pick_length(&lengths, needle.len()) {
        Some((len, _)) => end - len,
        None => end,
    }
}

/// Among candidate lengths, the lowest distance, then closest to `target`, then longest.
fn pick_length(lengths: &[usize], target: usize) -> Option<(usize, usize)> {
    lengths
        .iter()
        .enumerate()
        .min_by_key(|&(l, &d)| (d, l.abs_diff(target), std::cmp::Reverse(l)))
        .map(|(l, &d)| (l, d))
}

/// Edit distance DP, one haystack column at a time.
///
/// With `free_start`, entry `j` is the distance of the best substring of
/// `hay` ending at `j` (Sellers). Without it, entry `j` is the distance
/// between `needle` and `hay[..j]`.
fn distances(needle: &[char], hay: &[char], free_start: bool) -> Vec<usize> {
    let m = needle.len();
    let mut col: Vec<usize> = (0..=m).collect();
    let mut out = Vec::with_capacity(hay.len() + 1);
    out.push(m);

    for (j, &h) in hay.iter().enumerate() {
        let mut diag = col[0];
        col[0] = if free_start { 0 } else { j + 1 };
        for i in 1..=m {
            let above = col[i];
            let cost = usize::from(needle[i - 1] != h);
            col[i] = (diag + cost).min(above + 1).min(col[i - 1] + 1);
            diag = above;
        }
        out.push(col[m]);
    }

    out
}
