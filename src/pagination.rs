// src/pagination.rs
use serde::Serialize;

use crate::filters::SearchState;
use crate::models::ProductPublic;

/// Number of products per page on every storefront listing.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Pages shown without any ellipsis.
const FULL_WINDOW_MAX_PAGES: usize = 5;

/// One contiguous slice of a collection. `page_number` is 1-indexed.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
}

impl<T> Page<'_, T> {
    /// Index of the last item on the page, `None` for an empty page.
    pub fn end_index_inclusive(&self) -> Option<usize> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.end_index - 1)
        }
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Slices `items` into the requested page.
///
/// Page numbers are not clamped: page 0 or a page past `total_pages` yields an
/// empty slice with `end_index == start_index`.
pub fn paginate<T>(items: &[T], page_number: usize, page_size: usize) -> Page<'_, T> {
    let total_pages = total_pages(items.len(), page_size);
    let start_index = page_number.saturating_sub(1).saturating_mul(page_size);

    if page_number == 0 || page_number > total_pages {
        return Page {
            items: &[],
            total_pages,
            start_index,
            end_index: start_index,
        };
    }

    let end_index = (start_index + page_size).min(items.len());
    Page {
        items: &items[start_index..end_index],
        total_pages,
        start_index,
        end_index,
    }
}

/// Bounds a user-supplied page number to `[1, total_pages]` (1 when there are no pages).
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "page")]
pub enum PageSlot {
    Page(usize),
    Ellipsis,
}

/// Page numbers for pagination controls: first, last, and the neighbours of
/// the current page, with one ellipsis per skipped run.
pub fn compute_page_window(current_page: usize, total_pages: usize) -> Vec<PageSlot> {
    if total_pages == 0 {
        return Vec::new();
    }
    if total_pages <= FULL_WINDOW_MAX_PAGES {
        return (1..=total_pages).map(PageSlot::Page).collect();
    }

    let mut pages = vec![1, total_pages];
    for candidate in [
        current_page.saturating_sub(1),
        current_page,
        current_page.saturating_add(1),
    ] {
        if (1..=total_pages).contains(&candidate) {
            pages.push(candidate);
        }
    }
    pages.sort_unstable();
    pages.dedup();

    let mut window = Vec::with_capacity(pages.len() * 2);
    let mut previous: Option<usize> = None;
    for page in pages {
        if let Some(prev) = previous {
            if page > prev + 1 {
                window.push(PageSlot::Ellipsis);
            }
        }
        window.push(PageSlot::Page(page));
        previous = Some(page);
    }
    window
}

/// Page of products handed to the storefront, together with everything the
/// pagination controls need.
#[derive(Debug, Serialize)]
pub struct PaginatedProductsResponse {
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub per_page: usize,
    pub start_index: usize,
    pub end_index_inclusive: Option<usize>,
    pub page_window: Vec<PageSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_state: Option<SearchState>,
    pub data: Vec<ProductPublic>,
}

impl PaginatedProductsResponse {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1 && self.total_pages > 0
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageSlot::{Ellipsis, Page as P};

    #[test]
    fn thirty_items_make_three_pages_of_twelve() {
        let items: Vec<usize> = (0..30).collect();

        let first = paginate(&items, 1, 12);
        assert_eq!(first.total_pages, 3);
        assert_eq!((first.start_index, first.end_index), (0, 12));
        assert_eq!(first.items.len(), 12);

        let last = paginate(&items, 3, 12);
        assert_eq!((last.start_index, last.end_index), (24, 30));
        assert_eq!(last.items, &items[24..30]);
        assert_eq!(last.end_index_inclusive(), Some(29));
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let items: Vec<usize> = (0..30).collect();
        let beyond = paginate(&items, 4, 12);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 3);
        assert_eq!(beyond.end_index_inclusive(), None);

        assert!(paginate(&items, 0, 12).items.is_empty());
        assert!(paginate(&items, usize::MAX, 12).items.is_empty());
    }

    #[test]
    fn empty_collection_has_no_pages() {
        let items: Vec<usize> = Vec::new();
        let page = paginate(&items, 1, 12);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
        assert!(compute_page_window(1, 0).is_empty());
    }

    #[test]
    fn concatenated_pages_reproduce_the_collection() {
        for len in [0usize, 1, 11, 12, 13, 24, 30, 100] {
            for page_size in [1usize, 5, 12, 50] {
                let items: Vec<usize> = (0..len).collect();
                let pages = total_pages(len, page_size);
                let rebuilt: Vec<usize> = (1..=pages)
                    .flat_map(|n| paginate(&items, n, page_size).items.to_vec())
                    .collect();
                assert_eq!(rebuilt, items, "len={len} page_size={page_size}");
            }
        }
    }

    #[test]
    fn window_around_middle_page() {
        assert_eq!(
            compute_page_window(5, 10),
            vec![P(1), Ellipsis, P(4), P(5), P(6), Ellipsis, P(10)]
        );
    }

    #[test]
    fn small_totals_show_every_page() {
        assert_eq!(compute_page_window(1, 5), vec![P(1), P(2), P(3), P(4), P(5)]);
        assert_eq!(compute_page_window(3, 3), vec![P(1), P(2), P(3)]);
        assert_eq!(compute_page_window(1, 1), vec![P(1)]);
    }

    #[test]
    fn window_at_edges() {
        assert_eq!(compute_page_window(1, 10), vec![P(1), P(2), Ellipsis, P(10)]);
        assert_eq!(compute_page_window(10, 10), vec![P(1), Ellipsis, P(9), P(10)]);
        assert_eq!(compute_page_window(3, 10), vec![P(1), P(2), P(3), P(4), Ellipsis, P(10)]);
    }

    #[test]
    fn window_never_repeats_or_leaves_range() {
        for total in 0..=40usize {
            for current in 0..=total + 2 {
                let window = compute_page_window(current, total);
                let mut seen = Vec::new();
                for pair in window.windows(2) {
                    assert!(!(pair[0] == Ellipsis && pair[1] == Ellipsis));
                }
                for slot in &window {
                    if let P(n) = slot {
                        assert!((1..=total).contains(n), "page {n} outside 1..={total}");
                        assert!(!seen.contains(n), "duplicate page {n}");
                        seen.push(*n);
                    }
                }
                if total > 0 {
                    assert_eq!(window.first(), Some(&P(1)));
                    assert_eq!(window.last(), Some(&P(total)));
                }
            }
        }
    }

    #[test]
    fn clamp_bounds_user_input() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(9, 3), 3);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(4, 0), 1);
    }

    #[test]
    fn page_slot_serializes_with_kind_tag() {
        let json = serde_json::to_value(compute_page_window(1, 2)).unwrap();
        assert_eq!(json[0]["kind"], "page");
        assert_eq!(json[0]["page"], 1);
        let json = serde_json::to_value(PageSlot::Ellipsis).unwrap();
        assert_eq!(json["kind"], "ellipsis");
    }
}
