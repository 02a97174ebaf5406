use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default page size when the caller does not send one
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    /// Reject a zero page size and cap the page size at `max_page_size`
    pub fn bounded(self, max_page_size: u64) -> Result<Self, Error> {
        if self.page_size == 0 {
            return Err(Error::BadRequest(
                "page_size must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            page: self.page,
            page_size: self.page_size.min(max_page_size.max(1)),
        })
    }

    /// Take the window `[page * page_size, page * page_size + page_size)`.
    /// A window past the end is empty.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let start = self.page.saturating_mul(self.page_size);
        let (Ok(skip), Ok(take)) = (usize::try_from(start), usize::try_from(self.page_size))
        else {
            return Vec::new();
        };
        items.into_iter().skip(skip).take(take).collect()
    }
}
