//! # Pagination
//!
//! 1-based page requests and the pages returned by listing queries.
//!
//! ```text
//! 12 rows, page_size 10
//!   page 1 → offset 0,  rows 1-10
//!   page 2 → offset 10, rows 11-12
//!   page 3 → offset 20, empty (still a valid request)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Creates a page request.
    ///
    /// ## Rules
    /// - `page` starts at 1
    /// - `page_size` is between 1 and [`MAX_PAGE_SIZE`]
    pub fn new(page: u32, page_size: u32) -> ValidationResult<Self> {
        if page == 0 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
            });
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "page_size".to_string(),
                min: 1,
                max: i64::from(MAX_PAGE_SIZE),
            });
        }
        Ok(PageRequest { page, page_size })
    }

    /// First page with the given size.
    pub fn first(page_size: u32) -> ValidationResult<Self> {
        PageRequest::new(1, page_size)
    }

    #[inline]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// SQL `OFFSET`.
    #[inline]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// SQL `LIMIT`.
    #[inline]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Wraps one page of rows together with the total row count.
    pub fn into_page<T>(self, items: Vec<T>, total_count: i64) -> Page<T> {
        Page {
            items,
            total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the query across all pages.
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Number of pages needed for `total_count` rows (at least 1).
    pub fn total_pages(&self) -> u32 {
        if self.total_count <= 0 {
            return 1;
        }
        let size = i64::from(self.page_size.max(1));
        u32::try_from((self.total_count + size - 1) / size).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Maps the items, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
