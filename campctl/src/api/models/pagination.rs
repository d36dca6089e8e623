//! Shared pagination types for API query parameters.
//!
//! All list endpoints use page-based pagination with `page` and `limit`
//! parameters. Out-of-range values are clamped rather than rejected.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1)
/// - `limit`: Maximum items to return (default: 20, max: 100)
///
/// The `limit` is clamped to ensure it's always between 1 and 100,
/// preventing both zero-result queries and excessive data fetching.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Maximum number of items to return (default: 20, max: 100)
    #[param(default = 20, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the page value, clamped to at least 1.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Row offset corresponding to the requested page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Build envelope pagination metadata for a known total count.
    pub fn meta(&self, total_count: i64) -> PaginationMeta {
        PaginationMeta::new(self.page(), self.limit(), total_count)
    }
}

/// Pagination metadata included in the response envelope on list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// The page that was returned
    pub page: i64,
    /// Maximum items returned per page
    pub limit: i64,
    /// Total number of items matching the query (before pagination)
    pub total_count: i64,
    /// Total number of pages at this limit
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total_count: i64) -> Self {
        let total_pages = if total_count == 0 { 0 } else { (total_count + limit - 1) / limit };
        Self {
            page,
            limit,
            total_count,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_clamping() {
        // Zero is clamped to 1
        let p = Pagination {
            page: None,
            limit: Some(0),
        };
        assert_eq!(p.limit(), 1);

        // Negative is clamped to 1
        let p = Pagination {
            page: None,
            limit: Some(-5),
        };
        assert_eq!(p.limit(), 1);

        // Over max is clamped to MAX_LIMIT
        let p = Pagination {
            page: None,
            limit: Some(1000),
        };
        assert_eq!(p.limit(), MAX_LIMIT);

        // Valid value passes through
        let p = Pagination {
            page: None,
            limit: Some(50),
        };
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn test_page_clamping() {
        // Zero and negative pages are clamped to 1
        let p = Pagination {
            page: Some(0),
            limit: None,
        };
        assert_eq!(p.page(), 1);

        let p = Pagination {
            page: Some(-3),
            limit: None,
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let p = Pagination {
            page: Some(3),
            limit: Some(25),
        };
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn test_meta_total_pages() {
        let p = Pagination {
            page: Some(2),
            limit: Some(10),
        };
        let meta = p.meta(25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.page, 2);

        let meta = p.meta(0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_query_string_parsing() {
        // Pagination arrives via the query string, so numbers come in as strings
        let p: Pagination = serde_urlencoded::from_str("page=2&limit=50").unwrap();
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 50);
    }
}
