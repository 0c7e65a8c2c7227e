//! Render plan: what a grid should draw for one frame.
//!
//! Virtualized plans window over the whole result set, so spacers and grid
//! height describe every row the server reported. Their positions are
//! absolute; [`covering_pages`](crate::paging::covering_pages) names the pages
//! that must be materialized to fill the window.

use std::ops::Range;

use gridwire_core::{Pagination, ViewMode};
use serde::{Deserialize, Serialize};

use crate::card::{CardMetrics, CardWindow};
use crate::paging::{PageControl, RenderStrategy};
use crate::row::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT, RowMetrics, RowWindow};
use crate::scroll::{ContainerSize, ScrollState};

/// Viewport tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_row_height")]
    pub row_height: f64,
    #[serde(default = "default_overscan")]
    pub overscan: usize,
    #[serde(default = "default_card_width")]
    pub card_width: f64,
    #[serde(default = "default_card_height")]
    pub card_height: f64,
    #[serde(default = "default_gap")]
    pub gap: f64,
    /// Result sets with fewer rows than this are paged instead of virtualized
    #[serde(default = "default_virtualize_threshold")]
    pub virtualize_threshold: u64,
    #[serde(default)]
    pub prefer_paging: bool,
}

const fn default_row_height() -> f64 {
    DEFAULT_ROW_HEIGHT
}

const fn default_overscan() -> usize {
    DEFAULT_OVERSCAN
}

const fn default_card_width() -> f64 {
    250.0
}

const fn default_card_height() -> f64 {
    180.0
}

const fn default_gap() -> f64 {
    16.0
}

const fn default_virtualize_threshold() -> u64 {
    200
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            row_height: default_row_height(),
            overscan: default_overscan(),
            card_width: default_card_width(),
            card_height: default_card_height(),
            gap: default_gap(),
            virtualize_threshold: default_virtualize_threshold(),
            prefer_paging: false,
        }
    }
}

impl ViewportConfig {
    #[must_use]
    pub const fn row_height(mut self, row_height: f64) -> Self {
        self.row_height = row_height;
        self
    }

    #[must_use]
    pub const fn overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Set the measured card size.
    #[must_use]
    pub const fn card_size(mut self, width: f64, height: f64) -> Self {
        self.card_width = width;
        self.card_height = height;
        self
    }

    #[must_use]
    pub const fn virtualize_threshold(mut self, threshold: u64) -> Self {
        self.virtualize_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn prefer_paging(mut self, prefer_paging: bool) -> Self {
        self.prefer_paging = prefer_paging;
        self
    }

    #[must_use]
    pub const fn row_metrics(&self) -> RowMetrics {
        RowMetrics::new(self.row_height, self.overscan)
    }

    #[must_use]
    pub const fn card_metrics(&self) -> CardMetrics {
        CardMetrics::new(self.card_width, self.card_height, self.gap)
    }
}

/// Everything a plan depends on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderInput {
    pub mode: ViewMode,
    /// Rows materialized on the client for the current page.
    pub row_count: usize,
    /// Server-reported total.
    pub total_row_count: u64,
    pub pagination: Pagination,
    pub scroll: ScrollState,
    pub container: ContainerSize,
    pub config: ViewportConfig,
}

impl RenderInput {
    #[must_use]
    pub fn new(mode: ViewMode, row_count: usize, total_row_count: u64) -> Self {
        Self {
            mode,
            row_count,
            total_row_count,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    #[must_use]
    pub const fn with_scroll(mut self, scroll: ScrollState) -> Self {
        self.scroll = scroll;
        self
    }

    #[must_use]
    pub const fn with_container(mut self, container: ContainerSize) -> Self {
        self.container = container;
        self
    }

    #[must_use]
    pub const fn with_config(mut self, config: ViewportConfig) -> Self {
        self.config = config;
        self
    }

    /// Length of the virtual list: the reported total, or more if the
    /// current page extends past it.
    #[must_use]
    pub fn virtual_len(&self) -> usize {
        let materialized_end = self.pagination.offset().saturating_add(self.row_count as u64);
        usize::try_from(self.total_row_count.max(materialized_end)).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub const fn strategy(&self) -> RenderStrategy {
        RenderStrategy::select(
            self.total_row_count,
            self.config.virtualize_threshold,
            self.config.prefer_paging,
        )
    }
}

/// What to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "window", rename_all = "lowercase")]
pub enum RenderPlan {
    /// Virtualized table rows over the whole result set.
    Table(RowWindow),
    /// Virtualized card grid over the whole result set.
    Cards(CardWindow),
    /// All materialized rows of the current page plus a page navigator.
    Paged(PageControl),
}

impl RenderPlan {
    /// Plan for one frame. The strategy is re-evaluated on every call.
    #[must_use]
    pub fn compute(input: &RenderInput) -> Self {
        let strategy = input.strategy();
        tracing::trace!(
            mode = %input.mode,
            ?strategy,
            rows = input.row_count,
            total = input.total_row_count,
            "computing render plan"
        );

        if strategy.is_paginated() {
            return Self::Paged(PageControl::new(input.pagination, input.total_row_count));
        }

        let len = input.virtual_len();
        match input.mode {
            ViewMode::Table => Self::Table(RowWindow::compute(
                len,
                input.scroll.top,
                input.container.height,
                input.config.row_metrics(),
            )),
            ViewMode::Card => Self::Cards(CardWindow::compute(
                len,
                input.scroll.top,
                input.container.height,
                input.container.width,
                input.config.card_metrics(),
                input.config.overscan,
            )),
        }
    }

    /// Positions in the full result set that the plan renders. A paged plan
    /// renders its current page.
    #[must_use]
    pub fn visible_positions(&self) -> Range<u64> {
        match self {
            Self::Table(window) => window.start as u64..window.end as u64,
            Self::Cards(window) => {
                let first = window.cards.first().map_or(0, |c| c.index);
                let end = window.cards.last().map_or(first, |c| c.index.saturating_add(1));
                first as u64..end as u64
            }
            Self::Paged(control) => control.range_start.saturating_sub(1)..control.range_end,
        }
    }
}
