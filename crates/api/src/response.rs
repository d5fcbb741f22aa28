//! Shared response envelope types for API handlers.
//!
//! Single resources use `{ "data": ... }`; paged collections add a `meta`
//! block with the page position and totals.

use estate_core::query::{Page, Pagination};
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Position of a page within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(pagination: Pagination, total: i64) -> Self {
        let limit = pagination.limit.max(1);
        Self {
            page: pagination.page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// `{ "data": [T], "meta": {...} }` envelope for paged collections.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(page: Page<T>, pagination: Pagination) -> Self {
        Self {
            meta: PageMeta::new(pagination, page.total),
            data: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let pagination = Pagination::new(Some(2), Some(20));
        assert_eq!(PageMeta::new(pagination, 41).total_pages, 3);
        assert_eq!(PageMeta::new(pagination, 40).total_pages, 2);
        assert_eq!(PageMeta::new(pagination, 0).total_pages, 0);
    }

    #[test]
    fn meta_echoes_the_effective_page_and_limit() {
        let meta = PageMeta::new(Pagination::new(None, Some(500)), 7);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.limit, 100);
        assert_eq!(meta.total, 7);
        assert_eq!(meta.total_pages, 1);
    }
}
