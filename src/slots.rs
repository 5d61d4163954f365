//! Slot assignment for continuous-batched decoding
//!
//! A decode state holds `total_slots` concurrency units. Within one window,
//! row `i` lands in slot `i % total_slots`; the mapping is deterministic and
//! stateless. The critical invariant is that a window must never be larger
//! than the slot count: with `window.len() > total_slots` two rows map to
//! the same slot and the earlier row's in-flight state is silently
//! overwritten before it is ever read. [`SlotCycler::check_window`] rejects
//! that case up front instead of corrupting the measurement.
//!
//! The insert phase threads a single decode state through the window in
//! strictly increasing row order; each insert consumes the state by value
//! and yields its successor, so the hand-off is plain move semantics rather
//! than a queue.

use crate::dataset::Window;
use crate::error::{BenchResult, ForgeBenchError};

/// Maps window-relative row indices onto decode slots.
#[derive(Debug, Clone, Copy)]
pub struct SlotCycler {
    total_slots: usize,
}

impl SlotCycler {
    /// Build a cycler for an engine with `total_slots` concurrent decodes.
    pub fn new(total_slots: usize) -> Self {
        debug_assert!(total_slots > 0);
        SlotCycler { total_slots }
    }

    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    /// Slot for the row at `index_in_window`.
    pub fn assign(&self, index_in_window: usize) -> usize {
        index_in_window % self.total_slots
    }

    /// Reject windows that would collide rows onto a shared slot.
    pub fn check_window(&self, window: Window) -> BenchResult<()> {
        if window.len() > self.total_slots {
            return Err(ForgeBenchError::SlotOverflow {
                batch: window.len(),
                slots: self.total_slots,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn assignment_is_bijective_up_to_slot_count() {
        let cycler = SlotCycler::new(8);
        for batch in 1..=8 {
            let assigned: HashSet<usize> = (0..batch).map(|i| cycler.assign(i)).collect();
            assert_eq!(assigned.len(), batch, "collision at batch size {}", batch);
            assert!(assigned.iter().all(|&s| s < 8));
        }
    }

    #[test]
    fn oversized_window_collides() {
        let cycler = SlotCycler::new(8);
        let assigned: Vec<usize> = (0..9).map(|i| cycler.assign(i)).collect();
        let distinct: HashSet<usize> = assigned.iter().copied().collect();
        assert!(distinct.len() < assigned.len());
        assert_eq!(cycler.assign(8), cycler.assign(0));
    }

    #[test]
    fn check_window_accepts_up_to_capacity() {
        let cycler = SlotCycler::new(4);
        assert!(cycler.check_window(Window { start: 0, end: 4 }).is_ok());
        assert!(cycler.check_window(Window { start: 20, end: 23 }).is_ok());
    }

    #[test]
    fn check_window_rejects_overflow() {
        let cycler = SlotCycler::new(4);
        let err = cycler
            .check_window(Window { start: 0, end: 5 })
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeBenchError::SlotOverflow { batch: 5, slots: 4 }
        ));
    }
}
