//! Strategy selection and the classic pagination fallback.

use std::ops::Range;

use gridwire_core::Pagination;
use serde::{Deserialize, Serialize};

/// How a result set is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    Virtualized,
    Paginated,
}

impl RenderStrategy {
    /// `Paginated` below `threshold` rows or when paging is preferred.
    #[must_use]
    pub const fn select(total_row_count: u64, threshold: u64, prefer_paging: bool) -> Self {
        if prefer_paging || total_row_count < threshold {
            Self::Paginated
        } else {
            Self::Virtualized
        }
    }

    #[must_use]
    pub const fn is_paginated(self) -> bool {
        matches!(self, Self::Paginated)
    }
}

/// State of a page navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageControl {
    /// 0-based.
    pub page_index: u64,
    pub page_count: u64,
    /// 1-based first row of the page; 0 when there are no rows.
    pub range_start: u64,
    /// 1-based last row of the page.
    pub range_end: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageControl {
    #[must_use]
    pub const fn new(pagination: Pagination, total: u64) -> Self {
        let page_index = pagination.page_index();
        let page_count = pagination.page_count(total);
        let offset = pagination.offset();
        let (range_start, range_end) = if offset >= total {
            (0, 0)
        } else {
            let end = offset.saturating_add(pagination.size());
            (offset.saturating_add(1), if end < total { end } else { total })
        };

        Self {
            page_index,
            page_count,
            range_start,
            range_end,
            total,
            has_previous: page_index > 0,
            has_next: page_index.saturating_add(1) < page_count,
        }
    }

    /// "26-50 of 120".
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{} of {}", self.range_start, self.range_end, self.total)
    }

    /// Page index to move to, if there is a previous page.
    #[must_use]
    pub const fn previous(&self) -> Option<u64> {
        if self.has_previous {
            Some(self.page_index.saturating_sub(1))
        } else {
            None
        }
    }

    /// Page index to move to, if there is a next page.
    #[must_use]
    pub const fn next(&self) -> Option<u64> {
        if self.has_next {
            Some(self.page_index.saturating_add(1))
        } else {
            None
        }
    }
}

/// Indices of the pages of `page_size` rows that hold `positions`.
#[must_use]
pub fn covering_pages(positions: &Range<u64>, page_size: u64) -> Range<u64> {
    if positions.is_empty() {
        return 0..0;
    }
    let last = positions.end.saturating_sub(1);
    match (positions.start.checked_div(page_size), last.checked_div(page_size)) {
        (Some(first), Some(last)) => first..last.saturating_add(1),
        _ => 0..0,
    }
}
