//! Vector Clock Implementation
//!
//! Views are per-thread prefixes of program order used to represent
//! downward-closed sets of events ("everything happens-before-or-equal").
//!
//! # Theory
//!
//! A view maps every thread to the largest index it contains. Joining two
//! views takes the point-wise maximum, which makes views a join-semilattice:
//!
//! - `a ⊔ a = a` (idempotent)
//! - `a ⊔ b = b ⊔ a` (commutative)
//! - `(a ⊔ b) ⊔ c = a ⊔ (b ⊔ c)` (associative)
//!
//! # Implementation
//!
//! Components are stored inline for the common case of few threads and
//! spill to the heap beyond that.

use crate::domain::graph::{Event, ThreadId};
use smallvec::SmallVec;
use std::fmt;

/// Number of thread components stored without heap allocation
pub const INLINE_THREADS: usize = 8;

/// Common interface of the clocks attached to event labels
pub trait VectorClock: Clone + fmt::Debug {
    /// Whether `e` belongs to the represented set
    fn contains(&self, e: Event) -> bool;

    /// Add `e` (and, for dense clocks, its program-order prefix)
    fn update_idx(&mut self, e: Event);

    /// Point-wise join with `other`
    fn update(&mut self, other: &Self);

    /// Largest index recorded for `thread`, if any
    fn max_index(&self, thread: ThreadId) -> Option<u32>;

    /// Whether no event is represented
    fn is_empty(&self) -> bool;
}

/// Dense vector clock
///
/// # Representation
///
/// `counts[t]` is the number of events of thread `t` in the view, so the
/// view contains `(t, i)` iff `i < counts[t]`. A zero count means the
/// thread contributes nothing. Trailing zero components are never stored,
/// which keeps structural equality meaningful.
///
/// # Example
///
/// ```text
/// counts: [3, 0, 2]
/// contains: (t0, 0..=2), (t2, 0..=1)
/// Debug:    View[2, -, 1]
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct View {
    counts: SmallVec<[u32; INLINE_THREADS]>,
}

impl View {
    /// Create an empty view
    #[inline]
    pub fn new() -> Self {
        Self {
            counts: SmallVec::new(),
        }
    }

    /// Create the view of `e`'s program-order prefix
    pub fn from_event(e: Event) -> Self {
        let mut view = Self::new();
        view.update_idx(e);
        view
    }

    #[inline]
    fn count(&self, thread: ThreadId) -> u32 {
        self.counts.get(thread.as_usize()).copied().unwrap_or(0)
    }

    /// Largest index contained for `thread`
    #[inline]
    pub fn get(&self, thread: ThreadId) -> Option<u32> {
        self.count(thread).checked_sub(1)
    }

    /// Number of thread components stored
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Iterate over `(thread, max index)` for every contributing thread
    pub fn iter(&self) -> impl Iterator<Item = (ThreadId, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(t, &c)| (ThreadId(t as u32), c - 1))
    }

    /// Whether every event of `self` is also in `other`
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.counts
            .iter()
            .enumerate()
            .all(|(t, &c)| c <= other.count(ThreadId(t as u32)))
    }
}

impl VectorClock for View {
    #[inline]
    fn contains(&self, e: Event) -> bool {
        e.index < self.count(e.thread)
    }

    #[inline]
    fn update_idx(&mut self, e: Event) {
        let t = e.thread.as_usize();
        if t >= self.counts.len() {
            self.counts.resize(t + 1, 0);
        }
        self.counts[t] = self.counts[t].max(e.index + 1);
    }

    fn update(&mut self, other: &Self) {
        if other.counts.len() > self.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (mine, &theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine = (*mine).max(theirs);
        }
    }

    #[inline]
    fn max_index(&self, thread: ThreadId) -> Option<u32> {
        self.get(thread)
    }

    fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View[")?;
        for (i, &c) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match c.checked_sub(1) {
                Some(max) => write!(f, "{max}")?,
                None => write!(f, "-")?,
            }
        }
        write!(f, "]")
    }
}
