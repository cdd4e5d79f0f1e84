//! Dependency-aware views
//!
//! Under dependency-tracking models the causal prefix of an event is not
//! closed under program order: a write may depend on some earlier reads of
//! its thread but not on others. A `DepView` is a dense `View` with
//! per-thread *holes*, indices at or below the maximum that are not part of
//! the set.

use super::vector_clock::{VectorClock, View};
use crate::domain::graph::{Event, ThreadId};
use std::collections::BTreeSet;
use std::fmt;

/// View with holes
///
/// # Invariant
///
/// Every hole of thread `t` lies at or below `view.get(t)`.
#[derive(Clone, Default)]
pub struct DepView {
    view: View,
    holes: Vec<BTreeSet<u32>>,
}

impl DepView {
    /// Create an empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// Dense view without holes
    pub fn from_view(view: View) -> Self {
        Self {
            view,
            holes: Vec::new(),
        }
    }

    /// Dense over-approximation (holes ignored)
    pub fn as_view(&self) -> &View {
        &self.view
    }

    /// Holes recorded for `thread`, ascending
    pub fn holes(&self, thread: ThreadId) -> impl Iterator<Item = u32> + '_ {
        self.holes
            .get(thread.as_usize())
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    fn is_hole(&self, e: Event) -> bool {
        self.holes
            .get(e.thread.as_usize())
            .is_some_and(|set| set.contains(&e.index))
    }

    fn add_hole(&mut self, e: Event) {
        let t = e.thread.as_usize();
        if t >= self.holes.len() {
            self.holes.resize_with(t + 1, BTreeSet::new);
        }
        self.holes[t].insert(e.index);
    }

    fn remove_hole(&mut self, e: Event) {
        if let Some(set) = self.holes.get_mut(e.thread.as_usize()) {
            set.remove(&e.index);
        }
        self.trim();
    }

    fn trim(&mut self) {
        while self.holes.last().is_some_and(BTreeSet::is_empty) {
            self.holes.pop();
        }
    }
}

impl VectorClock for DepView {
    fn contains(&self, e: Event) -> bool {
        self.view.contains(e) && !self.is_hole(e)
    }

    /// Add exactly `e`: indices skipped over between the old maximum and
    /// `e` become holes.
    fn update_idx(&mut self, e: Event) {
        match self.view.get(e.thread) {
            Some(max) if e.index <= max => self.remove_hole(e),
            current => {
                let first_missing = current.map_or(0, |m| m + 1);
                for index in first_missing..e.index {
                    self.add_hole(Event::new(e.thread, index));
                }
                self.view.update_idx(e);
            }
        }
    }

    fn update(&mut self, other: &Self) {
        let threads = self.view.len().max(other.view.len());
        let mut holes: Vec<BTreeSet<u32>> = Vec::with_capacity(threads);
        for t in 0..threads {
            let tid = ThreadId(t as u32);
            let mut kept: BTreeSet<u32> = self
                .holes(tid)
                .filter(|&i| !other.contains(Event::new(tid, i)))
                .collect();
            kept.extend(
                other
                    .holes(tid)
                    .filter(|&i| !self.contains(Event::new(tid, i))),
            );
            holes.push(kept);
        }
        self.holes = holes;
        self.trim();
        self.view.update(&other.view);
    }

    fn max_index(&self, thread: ThreadId) -> Option<u32> {
        self.view.get(thread)
    }

    fn is_empty(&self) -> bool {
        self.view.is_empty()
    }
}

impl PartialEq for DepView {
    fn eq(&self, other: &Self) -> bool {
        let threads = self.holes.len().max(other.holes.len());
        self.view == other.view
            && (0..threads).all(|t| {
                let tid = ThreadId(t as u32);
                self.holes(tid).eq(other.holes(tid))
            })
    }
}

impl Eq for DepView {}

impl fmt::Debug for DepView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dep{:?}", self.view)?;
        let mut first = true;
        for (t, set) in self.holes.iter().enumerate() {
            if set.is_empty() {
                continue;
            }
            write!(f, "{}t{}:{:?}", if first { " holes{" } else { ", " }, t, set)?;
            first = false;
        }
        if !first {
            write!(f, "}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(t: u32, i: u32) -> Event {
        Event::new(ThreadId(t), i)
    }

    #[test]
    fn test_update_idx_leaves_holes() {
        let mut view = DepView::new();
        view.update_idx(ev(1, 3));
        assert!(view.contains(ev(1, 3)));
        assert!(!view.contains(ev(1, 0)));
        assert!(!view.contains(ev(1, 2)));
        assert_eq!(view.holes(ThreadId(1)).collect::<Vec<_>>(), vec![0, 1, 2]);

        view.update_idx(ev(1, 1));
        assert!(view.contains(ev(1, 1)));
        assert_eq!(view.holes(ThreadId(1)).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_update_fills_holes() {
        let mut a = DepView::new();
        a.update_idx(ev(1, 2)); // holes 0, 1
        let mut b = DepView::new();
        b.update_idx(ev(1, 0));
        b.update_idx(ev(1, 1));
        a.update(&b);
        assert!(a.contains(ev(1, 0)));
        assert!(a.contains(ev(1, 1)));
        assert!(a.contains(ev(1, 2)));
        assert_eq!(a.holes(ThreadId(1)).count(), 0);
    }

    #[test]
    fn test_update_keeps_common_holes() {
        let mut a = DepView::new();
        a.update_idx(ev(0, 2)); // holes 0, 1
        let mut b = DepView::new();
        b.update_idx(ev(0, 4)); // holes 0..=3
        b.update_idx(ev(0, 0));
        a.update(&b);
        assert!(a.contains(ev(0, 0)));
        assert!(!a.contains(ev(0, 1)));
        assert!(a.contains(ev(0, 2)));
        assert!(!a.contains(ev(0, 3)));
        assert!(a.contains(ev(0, 4)));
    }

    #[test]
    fn test_dense_view_has_no_holes() {
        let view = DepView::from_view(View::from_event(ev(2, 5)));
        assert!(view.contains(ev(2, 0)));
        assert!(view.contains(ev(2, 5)));
        assert_eq!(view.holes(ThreadId(2)).count(), 0);
    }

    #[test]
    fn test_equality_ignores_trailing_empty_threads() {
        let mut a = DepView::new();
        a.update_idx(ev(0, 0));
        let mut b = DepView::new();
        b.update_idx(ev(0, 0));
        b.update(&DepView::new());
        assert_eq!(a, b);
    }
}
