//! Page/limit handling for listing endpoints.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// A zero-based page request with a clamped limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Missing or negative pages become 0. Missing or non-positive limits
    /// become [`DEFAULT_LIMIT`]; large limits are capped at [`MAX_LIMIT`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 0).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination block returned alongside a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_resources: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn compute(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let total_pages = (total + request.limit - 1) / request.limit;
        Self {
            current_page: request.page,
            total_pages,
            total_resources: total,
            limit: request.limit,
            has_next_page: request.page < total_pages - 1,
            has_prev_page: request.page > 0,
        }
    }
}
