//! Pending schedule entries and their heap ordering.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callable run once.
pub(super) type OnceFn = Box<dyn FnOnce() + Send + 'static>;

/// Callable shared across the firings of a periodic item.
pub(super) type RepeatFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// What to run when an item comes due.
pub(super) enum ItemKind {
    /// Fire once and discard.
    Once(OnceFn),
    /// Fire, then come due again `interval` after the submission.
    Every {
        /// Spacing between successive submissions.
        interval: Duration,
        /// Shared callable.
        f: RepeatFn,
    },
}

/// An entry in the pending-item heap.
///
/// Ordered so that `BinaryHeap` (a max-heap) pops the earliest due time
/// first, and among equal due times the lowest sequence number.
pub(super) struct ScheduleItem {
    pub(super) due: Instant,
    pub(super) seq: u64,
    pub(super) kind: ItemKind,
}

impl ScheduleItem {
    pub(super) const fn due(&self) -> Instant {
        self.due
    }

    pub(super) const fn is_periodic(&self) -> bool {
        matches!(self.kind, ItemKind::Every { .. })
    }
}

impl PartialEq for ScheduleItem {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for ScheduleItem {}

impl PartialOrd for ScheduleItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduleItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys for min-heap behavior.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl fmt::Debug for ScheduleItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleItem")
            .field("due", &self.due)
            .field("seq", &self.seq)
            .field("periodic", &self.is_periodic())
            .finish()
    }
}
