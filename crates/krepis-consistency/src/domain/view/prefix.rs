//! Prefix views
//!
//! The causal prefix attached to every label is dense (porf) for models
//! that do not track dependencies and hole-aware (pporf) for those that do.

use super::dep_view::DepView;
use super::vector_clock::{VectorClock, View};
use crate::domain::graph::{Event, ThreadId};

/// Causal prefix of a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixView {
    /// Closure under program order and reads-from
    Porf(View),
    /// Closure under preserved program order and reads-from
    Pporf(DepView),
}

impl PrefixView {
    /// Empty prefix of the requested kind
    pub fn empty(dep_tracking: bool) -> Self {
        if dep_tracking {
            Self::Pporf(DepView::new())
        } else {
            Self::Porf(View::new())
        }
    }

    /// Whether holes are tracked
    pub const fn is_dep_tracking(&self) -> bool {
        matches!(self, Self::Pporf(_))
    }

    /// Dense over-approximation
    pub fn as_view(&self) -> &View {
        match self {
            Self::Porf(view) => view,
            Self::Pporf(view) => view.as_view(),
        }
    }
}

impl From<View> for PrefixView {
    fn from(view: View) -> Self {
        Self::Porf(view)
    }
}

impl From<DepView> for PrefixView {
    fn from(view: DepView) -> Self {
        Self::Pporf(view)
    }
}

impl VectorClock for PrefixView {
    fn contains(&self, e: Event) -> bool {
        match self {
            Self::Porf(view) => view.contains(e),
            Self::Pporf(view) => view.contains(e),
        }
    }

    fn update_idx(&mut self, e: Event) {
        match self {
            Self::Porf(view) => view.update_idx(e),
            Self::Pporf(view) => view.update_idx(e),
        }
    }

    /// # Panics
    ///
    /// Joining a dense prefix with a hole-aware one mixes two models'
    /// metadata and is a caller bug.
    fn update(&mut self, other: &Self) {
        match (self, other) {
            (Self::Porf(a), Self::Porf(b)) => a.update(b),
            (Self::Pporf(a), Self::Pporf(b)) => a.update(b),
            _ => panic!("cannot join porf and pporf prefix views"),
        }
    }

    fn max_index(&self, thread: ThreadId) -> Option<u32> {
        self.as_view().get(thread)
    }

    fn is_empty(&self) -> bool {
        self.as_view().is_empty()
    }
}
