//! Card-grid windowing.
//!
//! Cards flow into as many columns as fit the container. Rows of cards are
//! windowed like table rows, with a row pitch of `card_height + gap`, and
//! every rendered card gets an absolute offset inside the grid.

use serde::{Deserialize, Serialize};

use crate::row::{RowMetrics, RowWindow};

/// Measured card size. Measured once and reused for every plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardMetrics {
    pub card_width: f64,
    pub card_height: f64,
    pub gap: f64,
}

impl Default for CardMetrics {
    fn default() -> Self {
        Self {
            card_width: 250.0,
            card_height: 180.0,
            gap: 16.0,
        }
    }
}

impl CardMetrics {
    #[must_use]
    pub const fn new(card_width: f64, card_height: f64, gap: f64) -> Self {
        Self {
            card_width,
            card_height,
            gap,
        }
    }

    /// Horizontal distance between the left edges of adjacent cards.
    #[must_use]
    pub fn column_pitch(self) -> f64 {
        self.card_width + self.gap.max(0.0)
    }

    /// Vertical distance between the top edges of adjacent grid rows.
    #[must_use]
    pub fn row_pitch(self) -> f64 {
        self.card_height + self.gap.max(0.0)
    }

    /// `max(1, floor(container_width / (card_width + gap)))`.
    #[must_use]
    pub fn column_count(self, container_width: f64) -> usize {
        let pitch = self.column_pitch();
        if !(pitch.is_finite() && pitch > 0.0) {
            return 1;
        }
        crate::row::to_index(container_width / pitch).max(1)
    }
}

/// Absolute position of one rendered card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardPlacement {
    /// Index into the materialized rows.
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// Rendered cards of a grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CardWindow {
    pub column_count: usize,
    /// Number of grid rows for all cards.
    pub grid_row_count: usize,
    /// Window over grid rows.
    pub rows: RowWindow,
    pub cards: Vec<CardPlacement>,
    /// Height of the whole grid.
    pub total_height: f64,
}

impl CardWindow {
    /// Window over `len` cards.
    #[must_use]
    pub fn compute(
        len: usize,
        scroll_top: f64,
        viewport_height: f64,
        container_width: f64,
        metrics: CardMetrics,
        overscan: usize,
    ) -> Self {
        let column_count = metrics.column_count(container_width);
        let grid_row_count = len.div_ceil(column_count);
        let row_metrics = RowMetrics::new(metrics.row_pitch(), overscan);
        let rows = RowWindow::compute(grid_row_count, scroll_top, viewport_height, row_metrics);
        let pitch = row_metrics.effective_height();

        let cards = rows
            .range()
            .flat_map(|grid_row| {
                let first = grid_row.saturating_mul(column_count);
                let last = first.saturating_add(column_count).min(len);
                (first..last).map(move |index| CardPlacement {
                    index,
                    x: index.saturating_sub(first) as f64 * metrics.column_pitch(),
                    y: grid_row as f64 * pitch,
                })
            })
            .collect();

        Self {
            column_count,
            grid_row_count,
            rows,
            cards,
            total_height: grid_row_count as f64 * pitch,
        }
    }

    /// Indices of the rendered cards.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cards.iter().map(|c| c.index)
    }
}
