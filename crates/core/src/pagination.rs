//! Page offset/size pair whose offset is always a multiple of the size.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::result::Result;

/// Default page size for newly initialized views.
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Pagination of a list view.
///
/// Fields are private: every constructor computes the offset from a page
/// index, so `offset % size == 0` holds for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pagination {
    offset: u64,
    size: u64,
}

impl Pagination {
    /// Pagination at `page_index` (0-based) with `page_size` rows per page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPageSize`] for a zero page size and
    /// [`Error::PageOffsetOverflow`] if the offset does not fit in `u64`.
    pub fn new(page_index: u64, page_size: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidPageSize);
        }
        let offset = page_index
            .checked_mul(page_size)
            .ok_or(Error::PageOffsetOverflow {
                page_index,
                page_size,
            })?;
        Ok(Self {
            offset,
            size: page_size,
        })
    }

    /// First page with `page_size` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPageSize`] for a zero page size.
    pub fn first_page(page_size: u64) -> Result<Self> {
        Self::new(0, page_size)
    }

    /// Rebuild from a raw `start`/`size` pair, as sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPageSize`] for a zero size, or
    /// [`Error::Unknown`] when `start` is not page-aligned.
    pub fn from_offset(start: u64, size: u64) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidPageSize);
        }
        match (start.checked_rem(size), start.checked_div(size)) {
            (Some(0), Some(page_index)) => Self::new(page_index, size),
            _ => Err(Error::Unknown(format!(
                "offset {start} is not aligned to page size {size}"
            ))),
        }
    }

    /// Same page size, different page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PageOffsetOverflow`] if the offset overflows.
    pub fn with_page_index(self, page_index: u64) -> Result<Self> {
        Self::new(page_index, self.size)
    }

    /// New page size; the offset goes back to the first page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPageSize`] for a zero page size.
    pub fn with_page_size(self, page_size: u64) -> Result<Self> {
        Self::first_page(page_size)
    }

    /// Same size, first page.
    #[must_use]
    pub const fn reset(self) -> Self {
        Self {
            offset: 0,
            size: self.size,
        }
    }

    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }

    #[must_use]
    pub const fn size(self) -> u64 {
        self.size
    }

    /// 0-based page index.
    #[must_use]
    pub const fn page_index(self) -> u64 {
        match self.offset.checked_div(self.size) {
            Some(index) => index,
            None => 0,
        }
    }

    /// Number of pages needed for `total` rows (at least one).
    #[must_use]
    pub const fn page_count(self, total: u64) -> u64 {
        let pages = total.div_ceil(self.size);
        if pages == 0 { 1 } else { pages }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Deserialize)]
struct RawPagination {
    offset: u64,
    size: u64,
}

impl<'de> Deserialize<'de> for Pagination {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawPagination::deserialize(deserializer)?;
        Self::from_offset(raw.offset, raw.size).map_err(serde::de::Error::custom)
    }
}
