//! Scroll position, container size and pinned-header synchronization.

use serde::{Deserialize, Serialize};

/// Scroll offsets of the grid body in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollState {
    pub top: f64,
    pub left: f64,
}

impl ScrollState {
    #[must_use]
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }

    #[must_use]
    pub const fn vertical(top: f64) -> Self {
        Self { top, left: 0.0 }
    }
}

/// Size of the scroll container in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 700.0,
        }
    }
}

impl ContainerSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Keeps a pinned header horizontally aligned with the scrolling body.
///
/// The header offset always equals the last body offset seen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeaderSync {
    offset: f64,
}

impl HeaderSync {
    #[must_use]
    pub const fn new() -> Self {
        Self { offset: 0.0 }
    }

    /// Record a body scroll event.
    ///
    /// Returns the new header offset, or `None` if it did not move.
    /// Non-finite offsets are ignored.
    pub fn on_body_scroll(&mut self, left: f64) -> Option<f64> {
        if !left.is_finite() || left.to_bits() == self.offset.to_bits() {
            return None;
        }
        tracing::trace!(from = self.offset, to = left, "header offset changed");
        self.offset = left;
        Some(left)
    }

    /// Current header offset.
    #[must_use]
    pub const fn header_offset(&self) -> f64 {
        self.offset
    }
}
