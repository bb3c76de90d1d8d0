//! Offset pagination shared by the store layer and the REST routes.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u64 = 25;
const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page of `page_size` rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Clamps `page` to at least 1 and `page_size` to `1..=100`.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip. Saturates at `i64::MAX` so it always fits a SQL `OFFSET`.
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_previous: bool,
}

impl<T> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(page_size.max(1))
        };
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Swap in an already-transformed item list.
    pub fn with_items<U>(self, items: Vec<U>) -> PageResponse<U> {
        PageResponse {
            items,
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 1000);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        let req = PageRequest::new(u64::MAX, 25);
        assert_eq!(req.offset(), i64::MAX as u64);
        assert!(i64::try_from(req.offset()).is_ok());
    }

    #[test]
    fn test_page_response_math() {
        let resp = PageResponse::new(vec![1, 2], 2, 2, 5);
        assert_eq!(resp.total_pages, 3);
        assert!(resp.has_next);
        assert!(resp.has_previous);

        let empty: PageResponse<u8> = PageResponse::new(Vec::new(), 1, 25, 0);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
    }
}
