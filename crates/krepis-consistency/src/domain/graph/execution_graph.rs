//! Execution graph storage
//!
//! # Layout
//!
//! ```text
//! threads[t][i]      label of event (t, i)
//! stamps[s]          position of the label with stamp s
//! coherence[addr]    writes to addr in coherence order (initializer excluded)
//! init_readers[addr] reads of addr that observe the initializer
//! ```
//!
//! The graph owns all labels. Mutation goes through the methods below, which
//! keep reader lists and coherence sequences in sync with `rf` edges.
//! Malformed requests (reading from a non-write, placing a write after an
//! event at another location, ...) are caller bugs and panic.

use super::event::{Addr, Deps, Event, FreeKind, MemOrdering, RmwKind, Stamp, ThreadId};
use super::label::{EventLabel, LabelKind, ReadAccess, WriteAccess};
use crate::domain::view::{VectorClock, View};
use std::collections::BTreeMap;

/// Where a new write goes in its location's coherence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoPlacement {
    /// After every existing write
    Max,
    /// Immediately after the given write (`Event::INIT` for first)
    After(Event),
}

/// The execution graph
#[derive(Debug, Clone)]
pub struct ExecutionGraph {
    threads: Vec<Vec<EventLabel>>,
    stamps: Vec<Event>,
    coherence: BTreeMap<Addr, Vec<Event>>,
    init_readers: BTreeMap<Addr, Vec<Event>>,
}

impl Default for ExecutionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionGraph {
    /// Create a graph holding only the initializer in the main thread
    pub fn new() -> Self {
        let init = EventLabel::new(Event::INIT, Stamp(0), LabelKind::Init);
        Self {
            threads: vec![vec![init]],
            stamps: vec![Event::INIT],
            coherence: BTreeMap::new(),
            init_readers: BTreeMap::new(),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Queries
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Number of threads (including main)
    #[inline]
    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    /// Number of events in `thread`
    #[inline]
    pub fn thread_size(&self, thread: ThreadId) -> usize {
        self.threads.get(thread.as_usize()).map_or(0, Vec::len)
    }

    /// Total number of events
    #[inline]
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Whether only the initializer exists
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stamps.len() <= 1
    }

    /// Whether `e` names an existing event
    #[inline]
    pub fn contains(&self, e: Event) -> bool {
        e.index < self.thread_size(e.thread) as u32
    }

    /// Label at `e`, if it exists
    #[inline]
    pub fn try_label(&self, e: Event) -> Option<&EventLabel> {
        self.threads
            .get(e.thread.as_usize())
            .and_then(|t| t.get(e.index as usize))
    }

    /// Label at `e`
    ///
    /// # Panics
    ///
    /// If `e` does not exist.
    #[inline]
    pub fn label(&self, e: Event) -> &EventLabel {
        match self.try_label(e) {
            Some(lab) => lab,
            None => panic!("event {e} is not in the graph"),
        }
    }

    pub(crate) fn label_mut(&mut self, e: Event) -> &mut EventLabel {
        match self
            .threads
            .get_mut(e.thread.as_usize())
            .and_then(|t| t.get_mut(e.index as usize))
        {
            Some(lab) => lab,
            None => panic!("event {e} is not in the graph"),
        }
    }

    /// The initializer label
    #[inline]
    pub fn init_label(&self) -> &EventLabel {
        self.label(Event::INIT)
    }

    /// Largest stamp in use
    #[inline]
    pub fn max_stamp(&self) -> Stamp {
        Stamp((self.stamps.len() - 1) as u32)
    }

    /// Position of the label stamped `stamp`
    #[inline]
    pub fn event_at(&self, stamp: Stamp) -> Event {
        self.stamps[stamp.as_usize()]
    }

    /// Label stamped `stamp`
    #[inline]
    pub fn label_at(&self, stamp: Stamp) -> &EventLabel {
        self.label(self.event_at(stamp))
    }

    /// All labels in stamp order
    pub fn labels(&self) -> impl Iterator<Item = &EventLabel> + '_ {
        self.stamps.iter().map(move |&e| self.label(e))
    }

    /// Labels of one thread in program order
    pub fn thread_labels(&self, thread: ThreadId) -> &[EventLabel] {
        self.threads.get(thread.as_usize()).map_or(&[], Vec::as_slice)
    }

    /// Last label of `thread`
    pub fn last_thread_label(&self, thread: ThreadId) -> Option<&EventLabel> {
        self.threads.get(thread.as_usize()).and_then(|t| t.last())
    }

    /// Locations with at least one write or initializer read
    pub fn locations(&self) -> impl Iterator<Item = Addr> + '_ {
        let mut locs: Vec<Addr> = self
            .coherence
            .keys()
            .chain(self.init_readers.keys())
            .copied()
            .collect();
        locs.sort_unstable();
        locs.dedup();
        locs.into_iter()
    }

    /// Writes to `addr` in coherence order, initializer excluded
    #[inline]
    pub fn co(&self, addr: Addr) -> &[Event] {
        self.coherence.get(&addr).map_or(&[], Vec::as_slice)
    }

    /// Coherence-maximal write to `addr` (the initializer when none)
    #[inline]
    pub fn co_max(&self, addr: Addr) -> Event {
        self.co(addr).last().copied().unwrap_or(Event::INIT)
    }

    /// Position of `w` in its location's coherence order
    pub fn co_index(&self, addr: Addr, w: Event) -> Option<usize> {
        self.co(addr).iter().position(|&e| e == w)
    }

    /// Whether `w` is the coherence-maximal write of `addr`
    pub fn is_co_maximal(&self, addr: Addr, w: Event) -> bool {
        self.co_max(addr) == w
    }

    /// Reads of `addr` observing `w` (`w` may be the initializer)
    pub fn readers_of(&self, w: Event, addr: Addr) -> &[Event] {
        if w.is_init() {
            self.init_readers.get(&addr).map_or(&[], Vec::as_slice)
        } else {
            self.label(w).readers()
        }
    }

    /// Reads and writes of `addr`, in stamp order
    pub fn accesses_at(&self, addr: Addr) -> Vec<Event> {
        let mut accesses: Vec<Event> = self.readers_of(Event::INIT, addr).to_vec();
        for &w in self.co(addr) {
            accesses.push(w);
            accesses.extend_from_slice(self.readers_of(w, addr));
        }
        accesses.sort_unstable_by_key(|&e| self.label(e).stamp());
        accesses
    }

    /// For an RMW write, the read half of an older RMW that observes the same
    /// write, i.e. a competing RMW still in flight.
    pub fn pending_rmw(&self, w: Event) -> Option<Event> {
        let lab = self.label(w);
        if !lab.is_rmw_write() {
            return None;
        }
        let own_read = w.prev()?;
        let read = self.label(own_read).as_read()?;
        self.readers_of(read.rf, read.addr)
            .iter()
            .copied()
            .filter(|&r| r != own_read && self.label(r).is_rmw_read())
            .min_by_key(|&r| self.label(r).stamp())
    }

    /// Revisitable reads of `w`'s location that are older than `w` and not
    /// in the causal prefix `prefix`.
    pub fn revisitable<C: VectorClock>(&self, w: Event, prefix: &C) -> Vec<Event> {
        let lab = self.label(w);
        let Some(addr) = lab.access_addr() else {
            return Vec::new();
        };
        let stamp = lab.stamp();
        self.labels()
            .take_while(|l| l.stamp() < stamp)
            .filter(|l| {
                l.as_read()
                    .is_some_and(|r| r.addr == addr && r.revisitable)
                    && !prefix.contains(l.pos())
            })
            .map(EventLabel::pos)
            .collect()
    }

    /// View of every event stamped at or before `stamp`
    pub fn view_from_stamp(&self, stamp: Stamp) -> View {
        let mut view = View::new();
        for &e in self.stamps.iter().take(stamp.as_usize() + 1) {
            view.update_idx(e);
        }
        view
    }

    /// Whether any SC access or fence exists
    pub fn has_sc_events(&self) -> bool {
        self.labels().any(EventLabel::is_sc)
    }

    /// Innermost library method enclosing `e`, as its `MethodBegin`
    pub fn enclosing_method(&self, e: Event) -> Option<Event> {
        let labels = self.thread_labels(e.thread);
        let mut depth = 0usize;
        for l in labels[..(e.index as usize).min(labels.len())].iter().rev() {
            match l.kind() {
                LabelKind::MethodEnd { .. } => depth += 1,
                LabelKind::MethodBegin { .. } if depth == 0 => return Some(l.pos()),
                LabelKind::MethodBegin { .. } => depth -= 1,
                _ => {}
            }
        }
        None
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Construction
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn push_label(&mut self, thread: ThreadId, kind: LabelKind) -> Event {
        let t = thread.as_usize();
        assert!(t < self.threads.len(), "thread {thread} does not exist");
        let pos = Event::new(thread, self.threads[t].len() as u32);
        let stamp = Stamp(self.stamps.len() as u32);
        self.threads[t].push(EventLabel::new(pos, stamp, kind));
        self.stamps.push(pos);
        pos
    }

    /// Spawn a thread from `parent`; returns the create event and the child
    pub fn create_thread(&mut self, parent: ThreadId) -> (Event, ThreadId) {
        let child = ThreadId(self.threads.len() as u32);
        let create = self.push_label(parent, LabelKind::ThreadCreate { child });
        self.threads.push(Vec::new());
        self.push_label(
            child,
            LabelKind::ThreadStart {
                create: Some(create),
            },
        );
        (create, child)
    }

    /// Append a thread-finish event
    pub fn finish_thread(&mut self, thread: ThreadId) -> Event {
        self.push_label(thread, LabelKind::ThreadFinish)
    }

    /// Append a join of `child` to `thread`
    pub fn join_thread(&mut self, thread: ThreadId, child: ThreadId) -> Event {
        assert!(
            child.as_usize() < self.threads.len(),
            "joined thread {child} does not exist"
        );
        self.push_label(thread, LabelKind::ThreadJoin { child })
    }

    fn assert_rf_source(&self, rf: Event, addr: Addr) {
        if rf.is_init() {
            return;
        }
        let source = self.label(rf).as_write();
        assert!(
            source.is_some_and(|w| w.addr == addr),
            "{rf} is not a write to {addr}"
        );
    }

    fn link_reader(&mut self, rf: Event, addr: Addr, read: Event) {
        if rf.is_init() {
            self.init_readers.entry(addr).or_default().push(read);
        } else if let LabelKind::Write(w) = self.label_mut(rf).kind_mut() {
            w.readers.push(read);
        }
    }

    fn unlink_reader(&mut self, rf: Event, addr: Addr, read: Event) {
        let readers = if rf.is_init() {
            self.init_readers.get_mut(&addr)
        } else if let LabelKind::Write(w) = self.label_mut(rf).kind_mut() {
            Some(&mut w.readers)
        } else {
            None
        };
        if let Some(readers) = readers {
            readers.retain(|&r| r != read);
        }
    }

    fn push_read(
        &mut self,
        thread: ThreadId,
        addr: Addr,
        ordering: MemOrdering,
        rf: Event,
        rmw: Option<RmwKind>,
    ) -> Event {
        self.assert_rf_source(rf, addr);
        let read = self.push_label(
            thread,
            LabelKind::Read(ReadAccess {
                addr,
                ordering,
                rf,
                rmw,
                revisitable: true,
            }),
        );
        self.link_reader(rf, addr, read);
        read
    }

    /// Append a plain read of `addr` observing `rf`
    pub fn add_read(
        &mut self,
        thread: ThreadId,
        addr: Addr,
        ordering: MemOrdering,
        rf: Event,
    ) -> Event {
        self.push_read(thread, addr, ordering, rf, None)
    }

    /// Append the read half of an RMW
    pub fn add_rmw_read(
        &mut self,
        thread: ThreadId,
        addr: Addr,
        ordering: MemOrdering,
        rf: Event,
        kind: RmwKind,
    ) -> Event {
        self.push_read(thread, addr, ordering, rf, Some(kind))
    }

    fn insert_co(&mut self, addr: Addr, w: Event, placement: CoPlacement) {
        let co = self.coherence.entry(addr).or_default();
        let at = match placement {
            CoPlacement::Max => co.len(),
            CoPlacement::After(pred) if pred.is_init() => 0,
            CoPlacement::After(pred) => match co.iter().position(|&e| e == pred) {
                Some(i) => i + 1,
                None => panic!("{pred} is not a write to {addr}"),
            },
        };
        co.insert(at, w);
    }

    /// Append a plain write of `addr` placed at `placement`
    pub fn add_write(
        &mut self,
        thread: ThreadId,
        addr: Addr,
        ordering: MemOrdering,
        placement: CoPlacement,
    ) -> Event {
        let w = self.push_label(
            thread,
            LabelKind::Write(WriteAccess {
                addr,
                ordering,
                rmw: None,
                readers: Vec::new(),
            }),
        );
        self.insert_co(addr, w, placement);
        w
    }

    /// Append the write half of an RMW whose read is the last event of
    /// `thread`; it is placed immediately after the write that read observed.
    ///
    /// # Panics
    ///
    /// If the last event of `thread` is not the read half of an RMW.
    pub fn add_rmw_write(&mut self, thread: ThreadId, ordering: MemOrdering) -> Event {
        let (addr, rf, kind) = match self.last_thread_label(thread).and_then(EventLabel::as_read) {
            Some(ReadAccess {
                addr,
                rf,
                rmw: Some(kind),
                ..
            }) => (*addr, *rf, *kind),
            _ => panic!("RMW write in {thread} without a preceding RMW read"),
        };
        let w = self.push_label(
            thread,
            LabelKind::Write(WriteAccess {
                addr,
                ordering,
                rmw: Some(kind),
                readers: Vec::new(),
            }),
        );
        self.insert_co(addr, w, CoPlacement::After(rf));
        w
    }

    /// Append a fence
    pub fn add_fence(&mut self, thread: ThreadId, ordering: MemOrdering) -> Event {
        self.push_label(thread, LabelKind::Fence { ordering })
    }

    /// Append an allocation of `[addr, addr + size)`
    pub fn add_malloc(&mut self, thread: ThreadId, addr: Addr, size: u64) -> Event {
        self.push_label(thread, LabelKind::Malloc { addr, size })
    }

    /// Append a free of the block at `addr`
    pub fn add_free(&mut self, thread: ThreadId, addr: Addr) -> Event {
        self.push_label(
            thread,
            LabelKind::Free {
                addr,
                kind: FreeKind::Free,
            },
        )
    }

    /// Append a hazard-pointer retirement of the block at `addr`
    pub fn add_hp_retire(&mut self, thread: ThreadId, addr: Addr) -> Event {
        self.push_label(
            thread,
            LabelKind::Free {
                addr,
                kind: FreeKind::HpRetire,
            },
        )
    }

    /// Append entry into library method `name`
    pub fn add_method_begin(&mut self, thread: ThreadId, name: impl Into<String>) -> Event {
        self.push_label(thread, LabelKind::MethodBegin { name: name.into() })
    }

    /// Append exit from library method `name`
    pub fn add_method_end(&mut self, thread: ThreadId, name: impl Into<String>) -> Event {
        self.push_label(thread, LabelKind::MethodEnd { name: name.into() })
    }

    /// Record the dependencies of `e`
    pub fn set_deps(&mut self, e: Event, deps: Deps) {
        self.label_mut(e).set_deps(deps);
    }

    /// Mark whether `read` may still be revisited
    pub fn set_revisitable(&mut self, read: Event, revisitable: bool) {
        if let LabelKind::Read(r) = self.label_mut(read).kind_mut() {
            r.revisitable = revisitable;
        }
    }

    /// Redirect `read` to observe `rf`
    ///
    /// Views of `read` and of everything causally after it are stale until
    /// the checker recomputes them.
    ///
    /// # Panics
    ///
    /// If `read` is an RMW read (its write's coherence position would go
    /// stale) or `rf` is not a write to the same location.
    pub fn change_rf(&mut self, read: Event, rf: Event) {
        let (addr, old) = match self.label(read).as_read() {
            Some(r) if r.rmw.is_none() => (r.addr, r.rf),
            Some(_) => panic!("cannot redirect RMW read {read}"),
            None => panic!("{read} is not a read"),
        };
        self.assert_rf_source(rf, addr);
        self.unlink_reader(old, addr, read);
        if let LabelKind::Read(r) = self.label_mut(read).kind_mut() {
            r.rf = rf;
        }
        self.link_reader(rf, addr, read);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Addr = Addr::global(0);
    const Y: Addr = Addr::global(8);

    #[test]
    fn test_new_graph() {
        let g = ExecutionGraph::new();
        assert_eq!(g.num_threads(), 1);
        assert_eq!(g.max_stamp(), Stamp(0));
        assert!(g.init_label().is_init());
        assert!(g.is_empty());
        assert_eq!(g.co_max(X), Event::INIT);
    }

    #[test]
    fn test_stamps_increase() {
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let w = g.add_write(t1, X, MemOrdering::Relaxed, CoPlacement::Max);
        let r = g.add_read(ThreadId::MAIN, X, MemOrdering::Relaxed, w);
        let stamps: Vec<Stamp> = g.labels().map(EventLabel::stamp).collect();
        assert!(stamps.windows(2).all(|p| p[0] < p[1]));
        assert_eq!(g.label(r).rf(), Some(w));
        assert_eq!(g.readers_of(w, X), &[r]);
        assert_eq!(g.event_at(g.max_stamp()), r);
    }

    #[test]
    fn test_thread_creation() {
        let mut g = ExecutionGraph::new();
        let (create, child) = g.create_thread(ThreadId::MAIN);
        assert_eq!(child, ThreadId(1));
        let start = g.label(Event::new(child, 0));
        assert_eq!(start.kind(), &LabelKind::ThreadStart { create: Some(create) });
        let finish = g.finish_thread(child);
        let join = g.join_thread(ThreadId::MAIN, child);
        assert_eq!(g.last_thread_label(child).map(EventLabel::pos), Some(finish));
        assert_eq!(g.last_thread_label(ThreadId::MAIN).map(EventLabel::pos), Some(join));
    }

    #[test]
    fn test_coherence_placement() {
        let mut g = ExecutionGraph::new();
        let a = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        let b = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        let c = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::After(a));
        let d = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::After(Event::INIT));
        assert_eq!(g.co(X), &[d, a, c, b]);
        assert_eq!(g.co_index(X, c), Some(2));
        assert!(g.is_co_maximal(X, b));
    }

    #[test]
    fn test_rmw_write_follows_its_source() {
        let mut g = ExecutionGraph::new();
        let a = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        let _b = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        g.add_rmw_read(ThreadId::MAIN, X, MemOrdering::Relaxed, a, RmwKind::FetchOp);
        let w = g.add_rmw_write(ThreadId::MAIN, MemOrdering::Relaxed);
        assert_eq!(g.co_index(X, w), Some(1));
        assert!(g.label(w).is_rmw_write());
    }

    #[test]
    #[should_panic(expected = "without a preceding RMW read")]
    fn test_rmw_write_requires_read() {
        let mut g = ExecutionGraph::new();
        g.add_rmw_write(ThreadId::MAIN, MemOrdering::Relaxed);
    }

    #[test]
    #[should_panic(expected = "is not a write")]
    fn test_read_from_wrong_location_panics() {
        let mut g = ExecutionGraph::new();
        let w = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        g.add_read(ThreadId::MAIN, Y, MemOrdering::Relaxed, w);
    }

    #[test]
    fn test_change_rf_moves_reader() {
        let mut g = ExecutionGraph::new();
        let w = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        let r = g.add_read(ThreadId::MAIN, X, MemOrdering::Relaxed, Event::INIT);
        assert_eq!(g.readers_of(Event::INIT, X), &[r]);
        g.change_rf(r, w);
        assert!(g.readers_of(Event::INIT, X).is_empty());
        assert_eq!(g.readers_of(w, X), &[r]);
    }

    #[test]
    fn test_pending_rmw() {
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let r0 = g.add_rmw_read(ThreadId::MAIN, X, MemOrdering::Relaxed, Event::INIT, RmwKind::Cas);
        let r1 = g.add_rmw_read(t1, X, MemOrdering::Relaxed, Event::INIT, RmwKind::Cas);
        let w1 = g.add_rmw_write(t1, MemOrdering::Relaxed);
        assert_eq!(g.pending_rmw(w1), Some(r0));
        assert_ne!(g.pending_rmw(w1), Some(r1));
    }

    #[test]
    fn test_revisitable_excludes_prefix() {
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let r_main = g.add_read(ThreadId::MAIN, X, MemOrdering::Relaxed, Event::INIT);
        let r_t1 = g.add_read(t1, X, MemOrdering::Relaxed, Event::INIT);
        let w = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        let prefix = View::from_event(w);
        assert_eq!(g.revisitable(w, &prefix), vec![r_t1]);
        g.set_revisitable(r_t1, false);
        assert!(g.revisitable(w, &prefix).is_empty());
        assert!(!prefix.contains(r_t1));
        assert!(prefix.contains(r_main));
    }

    #[test]
    fn test_view_from_stamp() {
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let w = g.add_write(t1, X, MemOrdering::Relaxed, CoPlacement::Max);
        let view = g.view_from_stamp(g.label(w).stamp());
        assert!(view.contains(w));
        assert!(view.contains(Event::new(ThreadId::MAIN, 1)));
        let earlier = g.view_from_stamp(Stamp(1));
        assert!(!earlier.contains(w));
    }

    #[test]
    fn test_enclosing_method() {
        let mut g = ExecutionGraph::new();
        let begin = g.add_method_begin(ThreadId::MAIN, "push");
        let r = g.add_read(ThreadId::MAIN, X, MemOrdering::Relaxed, Event::INIT);
        g.add_method_end(ThreadId::MAIN, "push");
        let outside = g.add_read(ThreadId::MAIN, X, MemOrdering::Relaxed, Event::INIT);
        assert_eq!(g.enclosing_method(r), Some(begin));
        assert_eq!(g.enclosing_method(outside), None);
    }

    #[test]
    fn test_accesses_at() {
        let mut g = ExecutionGraph::new();
        let r = g.add_read(ThreadId::MAIN, X, MemOrdering::Relaxed, Event::INIT);
        let w = g.add_write(ThreadId::MAIN, X, MemOrdering::Relaxed, CoPlacement::Max);
        g.add_write(ThreadId::MAIN, Y, MemOrdering::Relaxed, CoPlacement::Max);
        assert_eq!(g.accesses_at(X), vec![r, w]);
    }
}
