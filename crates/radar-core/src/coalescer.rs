#![forbid(unsafe_code)]

//! Latest-wins coalescing for pointer moves.
//!
//! Browsers deliver pointer moves far faster than the overlay repaints. The
//! [`PointerCoalescer`] keeps only the most recent sample; the interaction
//! controller drains it once per frame and on pointer-up.
//!
//! ```
//! use radar_core::coalescer::PointerCoalescer;
//! use radar_core::geometry::Point;
//!
//! let mut coalescer = PointerCoalescer::new();
//! coalescer.push(Point::new(10, 10));
//! coalescer.push(Point::new(20, 20));
//! assert_eq!(coalescer.take(), Some(Point::new(20, 20)));
//! assert_eq!(coalescer.take(), None);
//! ```

use crate::geometry::Point;

/// Holds at most one pending pointer sample.
///
/// Not thread-safe; use from the single event-processing thread.
#[derive(Debug, Clone, Default)]
pub struct PointerCoalescer {
    pending: Option<Point>,
    /// Samples replaced before they were drained.
    coalesced: u64,
}

impl PointerCoalescer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sample, replacing any pending one.
    pub fn push(&mut self, position: Point) {
        if self.pending.replace(position).is_some() {
            self.coalesced = self.coalesced.saturating_add(1);
        }
    }

    /// Drain the pending sample.
    pub fn take(&mut self) -> Option<Point> {
        self.pending.take()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending sample without applying it.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Number of samples that were overwritten by a newer one.
    #[must_use]
    pub const fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}
