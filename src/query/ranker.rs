use crate::index::types::MatchResult;
use std::cmp::Ordering;

/// Order matches: exact before non-exact, then by descending score.
///
/// The sort is stable, so equal matches keep candidate discovery order.
pub fn rank(results: &mut [MatchResult]) {
    results.sort_by(compare_matches);
}

fn compare_matches(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.exact
        .cmp(&a.exact)
        .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
}

/// Number of pages needed for `count` items
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Slice out a 1-based page. Pages past the end (and page 0) are empty.
pub fn paginate<T>(ordered: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= ordered.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(ordered.len());
    &ordered[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(record: u32, score: f64, exact: bool) -> MatchResult {
        MatchResult {
            record,
            score,
            exact,
        }
    }

    #[test]
    fn test_rank_exact_first() {
        let mut results = vec![m(0, 90.0, false), m(1, 100.0, true), m(2, 100.0, false)];
        rank(&mut results);
        let order: Vec<u32> = results.iter().map(|r| r.record).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_rank_stable_ties() {
        let mut results = vec![m(3, 60.0, false), m(1, 80.0, false), m(2, 60.0, false), m(0, 60.0, false)];
        rank(&mut results);
        let order: Vec<u32> = results.iter().map(|r| r.record).collect();
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[test]
    fn test_paginate_partitions() {
        let items: Vec<u32> = (0..47).collect();
        let size = 10;
        let pages = total_pages(items.len(), size);

        let mut rebuilt = Vec::new();
        for p in 1..=pages {
            let page = paginate(&items, size, p);
            assert!(!page.is_empty());
            rebuilt.extend_from_slice(page);
        }
        assert_eq!(rebuilt, items);
        assert!(paginate(&items, size, pages + 1).is_empty());
        assert!(paginate(&items, size, 0).is_empty());
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(paginate(&items, 2, 3), &[5]);
    }
}
