//! Offset pagination

use serde::Serialize;

/// Page size used when the caller asks for a non-positive one
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// A clamped page request: `page >= 1`, `size >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: if page <= 0 { 1 } else { page },
            size: if size <= 0 { DEFAULT_PAGE_SIZE } else { size },
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}
