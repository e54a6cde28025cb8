// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const DEFAULT_PAGE_SIZE: usize = 25;

pub fn total_pages(total_size: i64, page_size: usize) -> usize {
    let page_size = page_size.max(1) as i64;
    if total_size <= 0 {
        return 1;
    }
    ((total_size + page_size - 1) / page_size).max(1) as usize
}

/// Page cursor over a server-side collection. `current_page` is 1-based and
/// stays within `1..=total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    current_page: usize,
    total_pages: usize,
    total_size: i64,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            total_pages: 1,
            total_size: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn total_size(&self) -> i64 {
        self.total_size
    }

    pub fn offset(&self) -> usize {
        self.offset_for(self.current_page)
    }

    pub fn offset_for(&self, page: usize) -> usize {
        page.max(1).saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn next_page(&mut self) -> bool {
        if self.current_page >= self.total_pages {
            return false;
        }
        self.current_page += 1;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.current_page -= 1;
        true
    }

    /// Records the collection size reported for a fetch of `requested_page`
    /// and clamps the cursor into the recomputed page range.
    pub fn apply(&mut self, requested_page: usize, total_size: i64) {
        self.total_size = total_size.max(0);
        self.total_pages = total_pages(self.total_size, self.page_size);
        self.current_page = requested_page.clamp(1, self.total_pages);
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::{Pager, total_pages};

    #[test]
    fn total_pages_is_at_least_one() {
        assert_eq!(total_pages(0, 25), 1);
        assert_eq!(total_pages(-3, 25), 1);
        assert_eq!(total_pages(1, 25), 1);
        assert_eq!(total_pages(25, 25), 1);
        assert_eq!(total_pages(26, 25), 2);
        assert_eq!(total_pages(1_000, 25), 40);
        assert_eq!(total_pages(10, 0), 10);
    }

    #[test]
    fn current_page_stays_in_range_for_any_size() {
        for page_size in [1_usize, 7, 25] {
            for total in 0_i64..120 {
                for requested in 0_usize..10 {
                    let mut pager = Pager::new(page_size);
                    pager.apply(requested, total);
                    assert!(pager.current_page() >= 1);
                    assert!(pager.current_page() <= pager.total_pages());
                    assert_eq!(pager.total_pages(), total_pages(total, page_size));
                }
            }
        }
    }

    #[test]
    fn shrinking_collection_clamps_page() {
        let mut pager = Pager::new(25);
        pager.apply(1, 100);
        assert!(pager.next_page());
        assert!(pager.next_page());
        assert!(pager.next_page());
        assert_eq!(pager.current_page(), 4);
        assert_eq!(pager.offset(), 75);

        pager.apply(4, 30);
        assert_eq!(pager.current_page(), 2);
        assert_eq!(pager.total_pages(), 2);
        assert!(!pager.next_page());
    }

    #[test]
    fn page_navigation_respects_bounds() {
        let mut pager = Pager::new(10);
        assert!(!pager.prev_page());
        assert!(!pager.next_page());

        pager.apply(1, 21);
        assert!(pager.next_page());
        assert!(pager.next_page());
        assert!(!pager.next_page());
        assert_eq!(pager.current_page(), 3);

        pager.reset();
        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.offset(), 0);
    }
}
