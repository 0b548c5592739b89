//! Page/size pagination for list endpoints.
//!
//! The two list styles differ on how they treat out-of-range values:
//! leads fall back to the default size, templates clamp into range.

use serde::Deserialize;

/// Resolved page window, ready to feed into `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Saturates instead of overflowing; a page far past the end is empty.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&size=` as used by the leads list.
#[derive(Debug, Default, Deserialize)]
pub struct PageSizeQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageSizeQuery {
    pub const DEFAULT_SIZE: i64 = 50;

    /// Page below 1 becomes 1; a size outside 1..=100 becomes the default.
    pub fn resolve(&self) -> PageRequest {
        let page = self.page.unwrap_or(1).max(1);
        let size = match self.size {
            Some(size) if (1..=MAX_PAGE_SIZE).contains(&size) => size,
            _ => Self::DEFAULT_SIZE,
        };
        PageRequest {
            page,
            per_page: size,
        }
    }
}

/// `?page=&limit=` as used by the templates list.
#[derive(Debug, Default, Deserialize)]
pub struct PageLimitQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageLimitQuery {
    pub const DEFAULT_LIMIT: i64 = 20;

    /// Page below 1 becomes 1; limit is clamped into 1..=100.
    pub fn resolve(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults() {
        let req = PageSizeQuery::default().resolve();
        assert_eq!(req, PageRequest { page: 1, per_page: 50 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn page_size_out_of_range_falls_back() {
        let req = PageSizeQuery {
            page: Some(-3),
            size: Some(500),
        }
        .resolve();
        assert_eq!(req, PageRequest { page: 1, per_page: 50 });

        let req = PageSizeQuery {
            page: Some(3),
            size: Some(10),
        }
        .resolve();
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn page_limit_clamps() {
        let req = PageLimitQuery {
            page: Some(0),
            limit: Some(1000),
        }
        .resolve();
        assert_eq!(req, PageRequest { page: 1, per_page: 100 });

        let req = PageLimitQuery {
            page: Some(2),
            limit: Some(0),
        }
        .resolve();
        assert_eq!(req, PageRequest { page: 2, per_page: 1 });
        assert_eq!(req.offset(), 1);
    }

    #[test]
    fn huge_page_offset_saturates() {
        let req = PageLimitQuery {
            page: Some(i64::MAX),
            limit: Some(100),
        }
        .resolve();
        assert_eq!(req.offset(), i64::MAX);

        let req = PageSizeQuery {
            page: Some(i64::MAX),
            size: Some(100),
        }
        .resolve();
        assert_eq!(req.offset(), i64::MAX);
    }
}
