use std::collections::BTreeSet;

/// Pages searched for an abstract: the first two and the last two.
///
/// Abstracts sit at the front of a paper, and translated abstracts are
/// sometimes repeated at the back. Body pages are never searched.
pub fn page_window(page_count: usize) -> BTreeSet<usize> {
    [1, 2, page_count.saturating_sub(1), page_count]
        .into_iter()
        .filter(|&p| p >= 1 && p <= page_count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(n: usize) -> Vec<usize> {
        page_window(n).into_iter().collect()
    }

    #[test]
    fn test_ten_pages() {
        assert_eq!(window(10), vec![1, 2, 9, 10]);
    }

    #[test]
    fn test_small_documents() {
        assert_eq!(window(3), vec![1, 2, 3]);
        assert_eq!(window(2), vec![1, 2]);
        assert_eq!(window(1), vec![1]);
        assert!(window(0).is_empty());
    }

    #[test]
    fn test_four_pages_covers_all() {
        assert_eq!(window(4), vec![1, 2, 3, 4]);
    }
}
