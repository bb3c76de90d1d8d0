//! `?page=&per_page=` query parameters.

use serde::Deserialize;

use herald_core::types::pagination::PageRequest;

/// Paging query for list endpoints. Out-of-range values are clamped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationParams {
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        let defaults = PageRequest::default();
        Self {
            page: defaults.page,
            per_page: defaults.page_size,
        }
    }
}

impl PaginationParams {
    pub fn into_page_request(self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}
