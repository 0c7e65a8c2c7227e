//! Fixed-height row windowing.
//!
//! Only rows intersecting the viewport, plus `overscan` rows on each side,
//! are rendered. Two spacers stand in for the rows above and below the
//! window so the scroll height matches the full list.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Row height used when none is configured.
pub const DEFAULT_ROW_HEIGHT: f64 = 70.0;

/// Rows rendered beyond each edge of the viewport.
pub const DEFAULT_OVERSCAN: usize = 10;

/// Row height and overscan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowMetrics {
    pub row_height: f64,
    pub overscan: usize,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl RowMetrics {
    #[must_use]
    pub const fn new(row_height: f64, overscan: usize) -> Self {
        Self {
            row_height,
            overscan,
        }
    }

    /// Row height usable as a divisor.
    pub(crate) fn effective_height(self) -> f64 {
        if self.row_height.is_finite() && self.row_height > 0.0 {
            self.row_height
        } else {
            DEFAULT_ROW_HEIGHT
        }
    }
}

/// The rows to render and the spacers around them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RowWindow {
    /// First rendered row.
    pub start: usize,
    /// One past the last rendered row.
    pub end: usize,
    /// Height standing in for rows `0..start`.
    pub top_spacer: f64,
    /// Height standing in for rows `end..len`.
    pub bottom_spacer: f64,
}

impl RowWindow {
    /// Window over `len` rows for the given scroll position.
    ///
    /// `start = floor(scroll_top / h) - overscan` (saturating) and
    /// `end = min(len, start + ceil(viewport_height / h) + 2 * overscan)`.
    #[must_use]
    pub fn compute(len: usize, scroll_top: f64, viewport_height: f64, metrics: RowMetrics) -> Self {
        let height = metrics.effective_height();
        let first_visible = to_index(scroll_top / height);
        let visible = to_index((viewport_height / height).ceil());

        let start = first_visible.saturating_sub(metrics.overscan).min(len);
        let end = start
            .saturating_add(visible)
            .saturating_add(metrics.overscan.saturating_mul(2))
            .min(len);

        Self {
            start,
            end,
            top_spacer: start as f64 * height,
            bottom_spacer: len.saturating_sub(end) as f64 * height,
        }
    }

    /// Rendered row indices.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of rendered rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Floor a non-negative pixel quotient to an index; negative and NaN map to 0.
pub(crate) fn to_index(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.floor() as usize
    }
}
