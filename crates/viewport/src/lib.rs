#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # gridwire-viewport
//!
//! Virtualized rendering math for gridwire grids.
//!
//! ## Features
//!
//! - Fixed-height row windowing with overscan and spacers
//! - Card-grid windowing with absolute card offsets
//! - Pinned-header horizontal scroll sync
//! - Pagination fallback for small result sets
//!
//! ## Example
//!
//! ```ignore
//! use gridwire_viewport::{ContainerSize, RenderInput, RenderPlan, ScrollState};
//!
//! let input = RenderInput::new(view.view_mode, view.rows.len(), view.total_row_count)
//!     .with_pagination(view.pagination)
//!     .with_scroll(ScrollState::vertical(scroll_top))
//!     .with_container(ContainerSize::new(width, height));
//!
//! match RenderPlan::compute(&input) {
//!     RenderPlan::Table(window) => draw_rows(window.range(), window.top_spacer),
//!     RenderPlan::Cards(window) => draw_cards(&window.cards),
//!     RenderPlan::Paged(control) => draw_page(&view.rows, &control),
//! }
//! ```

pub mod card;
pub mod paging;
pub mod plan;
pub mod row;
pub mod scroll;

pub use card::{CardMetrics, CardPlacement, CardWindow};
pub use paging::{PageControl, RenderStrategy, covering_pages};
pub use plan::{RenderInput, RenderPlan, ViewportConfig};
pub use row::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT, RowMetrics, RowWindow};
pub use scroll::{ContainerSize, HeaderSync, ScrollState};
