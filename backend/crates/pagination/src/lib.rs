//! Page-number pagination primitives shared by list endpoints.
//!
//! A [`PageRequest`] captures a validated `(page, per_page)` pair taken from
//! query parameters and exposes the SQL offset/limit derived from it. A
//! [`PageEnvelope`] wraps one page of items together with the totals a client
//! needs to render pagination controls.
//!
//! Page numbers are 1-based. Requests for page 0 are clamped to the first
//! page rather than rejected, matching the forgiving behaviour expected from
//! hand-typed `?paged=` query strings.

use serde::{Deserialize, Serialize};

/// Errors raised while constructing pagination primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// The page size must be at least one item.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// A validated request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Default number of items per page used by list endpoints.
    pub const DEFAULT_PER_PAGE: u32 = 15;

    /// Build a request for the given 1-based page number.
    ///
    /// Page numbers below one are clamped to the first page.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `per_page` is zero.
    pub fn new(page: u32, per_page: u32) -> Result<Self, PaginationError> {
        if per_page == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self {
            page: page.max(1),
            per_page,
        })
    }

    /// Build a request for the first page with the default page size.
    #[must_use]
    pub fn first() -> Self {
        Self {
            page: 1,
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// The number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// The row offset to skip when querying this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    /// The maximum number of rows to fetch for this page.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of items plus the totals needed for pagination controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    /// The items on this page, at most `per_page` of them.
    pub items: Vec<T>,
    /// The 1-based page number these items belong to.
    pub page: u32,
    /// The page size the listing was produced with.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages at this page size.
    pub total_pages: u64,
}

impl<T> PageEnvelope<T> {
    /// Wrap a fetched page of items with totals derived from `total_items`.
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page(),
            per_page: request.per_page(),
            total_items,
            total_pages: total_items.div_ceil(u64::from(request.per_page())),
        }
    }

    /// Map the items of this envelope, keeping the totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageEnvelope<U> {
        PageEnvelope {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 15, 0)]
    #[case(2, 15, 15)]
    #[case(3, 10, 20)]
    fn offset_skips_previous_pages(#[case] page: u32, #[case] per_page: u32, #[case] offset: i64) {
        let request = PageRequest::new(page, per_page).expect("valid request");
        assert_eq!(request.offset(), offset);
        assert_eq!(request.limit(), i64::from(per_page));
    }

    #[rstest]
    fn page_zero_is_clamped_to_first_page() {
        let request = PageRequest::new(0, 15).expect("valid request");
        assert_eq!(request.page(), 1);
        assert_eq!(request.offset(), 0);
    }

    #[rstest]
    fn zero_page_size_is_rejected() {
        assert_eq!(
            PageRequest::new(1, 0),
            Err(PaginationError::ZeroPageSize)
        );
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(15, 1)]
    #[case(16, 2)]
    #[case(31, 3)]
    fn envelope_computes_total_pages(#[case] total_items: u64, #[case] total_pages: u64) {
        let envelope = PageEnvelope::new(Vec::<u8>::new(), PageRequest::first(), total_items);
        assert_eq!(envelope.total_pages, total_pages);
        assert_eq!(envelope.per_page, PageRequest::DEFAULT_PER_PAGE);
    }

    #[rstest]
    fn map_preserves_totals() {
        let envelope = PageEnvelope::new(vec![1, 2, 3], PageRequest::first(), 3);
        let mapped = envelope.map(|n| n * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total_items, 3);
        assert_eq!(mapped.total_pages, 1);
    }
}
