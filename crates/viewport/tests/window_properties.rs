//! Property-based tests for viewport windowing.
//!
//! Uses proptest to validate:
//! - Row windows stay inside the list and cover the visible rows
//! - Spacers plus rendered rows always add up to the full scroll height
//! - Card windows place every card once, in its own column
//! - Paging ranges stay within the total

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use gridwire_core::Pagination;
use gridwire_viewport::{CardMetrics, CardWindow, PageControl, RowMetrics, RowWindow};
use proptest::prelude::*;

proptest! {
    #[test]
    fn row_window_is_bounded(
        len in 0usize..100_000,
        scroll_top in 0.0f64..10_000_000.0,
        viewport_height in 0.0f64..4000.0,
        row_height in 1.0f64..400.0,
        overscan in 0usize..50,
    ) {
        let window = RowWindow::compute(len, scroll_top, viewport_height, RowMetrics::new(row_height, overscan));

        prop_assert!(window.start <= window.end);
        prop_assert!(window.end <= len);
    }

    #[test]
    fn row_window_covers_visible_rows(
        len in 1usize..50_000,
        fraction in 0.0f64..0.999,
        viewport_height in 1.0f64..4000.0,
        row_height in 1.0f64..400.0,
        overscan in 0usize..50,
    ) {
        let scroll_top = fraction * len as f64 * row_height;
        let window = RowWindow::compute(len, scroll_top, viewport_height, RowMetrics::new(row_height, overscan));
        let first_visible = ((scroll_top / row_height).floor() as usize).min(len.saturating_sub(1));

        prop_assert!(window.start <= first_visible);
        prop_assert!(window.end > first_visible);
    }

    #[test]
    fn spacers_preserve_scroll_height(
        len in 0usize..100_000,
        scroll_top in 0.0f64..10_000_000.0,
        row_height in 1.0f64..400.0,
    ) {
        let metrics = RowMetrics::new(row_height, 10);
        let window = RowWindow::compute(len, scroll_top, 700.0, metrics);
        let total = window.top_spacer + window.len() as f64 * row_height + window.bottom_spacer;
        let expected = len as f64 * row_height;

        prop_assert!((total - expected).abs() <= expected * 1e-9 + 1e-6);
    }

    #[test]
    fn cards_are_unique_and_in_their_columns(
        len in 0usize..5_000,
        scroll_top in 0.0f64..200_000.0,
        container_width in 0.0f64..4000.0,
        card_width in 50.0f64..400.0,
        gap in 0.0f64..40.0,
    ) {
        let metrics = CardMetrics::new(card_width, 180.0, gap);
        let window = CardWindow::compute(len, scroll_top, 800.0, container_width, metrics, 2);

        prop_assert!(window.column_count >= 1);
        prop_assert_eq!(window.grid_row_count, len.div_ceil(window.column_count));

        let mut previous = None;
        for card in &window.cards {
            prop_assert!(card.index < len);
            prop_assert!(previous.is_none_or(|p| p < card.index));
            prop_assert!(card.x < window.column_count as f64 * metrics.column_pitch());
            previous = Some(card.index);
        }
    }

    #[test]
    fn page_range_within_total(
        page_index in 0u64..1000,
        page_size in 1u64..500,
        total in 0u64..100_000,
    ) {
        let pagination = Pagination::new(page_index, page_size)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let control = PageControl::new(pagination, total);

        prop_assert!(control.range_end <= total);
        prop_assert!(control.range_start <= control.range_end);
        prop_assert!(control.page_count >= 1);
        prop_assert_eq!(control.has_previous, page_index > 0);
    }
}
