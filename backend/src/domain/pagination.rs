//! Page-based pagination with a fixed page size.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of records per page across every paginated listing.
pub const PAGE_SIZE: u32 = 10;

/// A 1-based page number. Values below 1 clamp to the first page.
///
/// # Examples
/// ```
/// use backend::domain::PageNumber;
///
/// assert_eq!(PageNumber::new(0).get(), 1);
/// assert_eq!(PageNumber::new(3).offset(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PageNumber(u32);

impl PageNumber {
    /// First page.
    pub const FIRST: Self = Self(1);

    /// Build a page number, clamping zero to the first page.
    pub fn new(value: u32) -> Self {
        Self(value.max(1))
    }

    /// The 1-based page number.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Row offset for the store query.
    pub fn offset(self) -> i64 {
        i64::from(self.0 - 1) * i64::from(PAGE_SIZE)
    }

    /// Row limit for the store query.
    pub fn limit(self) -> i64 {
        i64::from(PAGE_SIZE)
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// How many pages a total record count spans.
pub fn total_pages(total: u64) -> u64 {
    total.div_ceil(u64::from(PAGE_SIZE))
}
