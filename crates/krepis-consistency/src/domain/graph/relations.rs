//! Relation accessors
//!
//! Thin wrappers that resolve the primitive relations (po, rf, co, fr,
//! thread create/join, dependencies, allocation lifetime) for one event.
//! Absence is a normal answer: the first event of a thread has no po
//! predecessor, a non-read has no rf source, and so on.

use super::event::{Addr, Event};
use super::execution_graph::ExecutionGraph;
use super::label::{EventLabel, LabelKind};

impl ExecutionGraph {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Program order
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Previous event of the same thread (the initializer is never returned)
    pub fn po_imm_pred(&self, e: Event) -> Option<Event> {
        e.prev().filter(|p| !p.is_init())
    }

    /// Next event of the same thread, if already added
    pub fn po_imm_succ(&self, e: Event) -> Option<Event> {
        if e.is_init() {
            return None;
        }
        let next = e.next();
        self.contains(next).then_some(next)
    }

    /// All program-order predecessors, nearest first
    pub fn po_preds(&self, e: Event) -> impl Iterator<Item = Event> {
        let first = if e.thread == Event::INIT.thread { 1 } else { 0 };
        (first..e.index).rev().map(move |i| Event::new(e.thread, i))
    }

    /// Nearest program-order predecessor accessing the same location
    pub fn poloc_imm_pred(&self, e: Event) -> Option<Event> {
        let addr = self.label(e).access_addr()?;
        self.po_preds(e)
            .find(|&p| self.label(p).access_addr() == Some(addr))
    }

    /// Nearest program-order successor accessing the same location
    pub fn poloc_imm_succ(&self, e: Event) -> Option<Event> {
        let addr = self.label(e).access_addr()?;
        self.thread_labels(e.thread)
            .iter()
            .skip(e.index as usize + 1)
            .find(|l| l.access_addr() == Some(addr))
            .map(EventLabel::pos)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Reads-from
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// The write a read observes
    pub fn rf_pred(&self, e: Event) -> Option<Event> {
        self.label(e).rf()
    }

    /// Reads observing `w`; for the initializer, across all locations
    pub fn rf_succs(&self, w: Event) -> Vec<Event> {
        if w.is_init() {
            return self
                .locations()
                .flat_map(|addr| self.readers_of(Event::INIT, addr).to_vec())
                .collect();
        }
        self.label(w).readers().to_vec()
    }

    /// rf source in the same thread
    pub fn rfi_pred(&self, e: Event) -> Option<Event> {
        self.rf_pred(e).filter(|&w| !w.is_external_to(e))
    }

    /// rf source in another thread (or the initializer)
    pub fn rfe_pred(&self, e: Event) -> Option<Event> {
        self.rf_pred(e).filter(|&w| w.is_external_to(e))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Coherence and from-read
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn write_addr(&self, w: Event) -> Option<Addr> {
        self.label(w).as_write().map(|w| w.addr)
    }

    /// Immediate coherence predecessor of a write (the initializer for the
    /// first write of a location)
    pub fn co_imm_pred(&self, w: Event) -> Option<Event> {
        let addr = self.write_addr(w)?;
        let i = self.co_index(addr, w)?;
        Some(if i == 0 { Event::INIT } else { self.co(addr)[i - 1] })
    }

    /// Immediate coherence successor of `w` (which may be the initializer)
    /// at `addr`
    pub fn co_imm_succ_at(&self, w: Event, addr: Addr) -> Option<Event> {
        let co = self.co(addr);
        if w.is_init() {
            return co.first().copied();
        }
        let i = co.iter().position(|&e| e == w)?;
        co.get(i + 1).copied()
    }

    /// Immediate coherence successor of a write
    pub fn co_imm_succ(&self, w: Event) -> Option<Event> {
        let addr = self.write_addr(w)?;
        self.co_imm_succ_at(w, addr)
    }

    /// All coherence successors of a write, nearest first
    pub fn co_succs(&self, w: Event) -> &[Event] {
        let Some(addr) = self.write_addr(w) else {
            return &[];
        };
        let co = self.co(addr);
        match co.iter().position(|&e| e == w) {
            Some(i) => &co[i + 1..],
            None => &[],
        }
    }

    /// All coherence predecessors of a write, the initializer first
    pub fn co_preds(&self, w: Event) -> Vec<Event> {
        let Some(addr) = self.write_addr(w) else {
            return Vec::new();
        };
        let co = self.co(addr);
        let end = co.iter().position(|&e| e == w).unwrap_or(0);
        std::iter::once(Event::INIT)
            .chain(co[..end].iter().copied())
            .collect()
    }

    /// Reads whose source is the immediate coherence predecessor of `w`
    pub fn fr_imm_preds(&self, w: Event) -> Vec<Event> {
        let (Some(addr), Some(pred)) = (self.write_addr(w), self.co_imm_pred(w)) else {
            return Vec::new();
        };
        self.readers_of(pred, addr).to_vec()
    }

    /// Immediate coherence successor of the write a read observes
    pub fn fr_imm_succ(&self, r: Event) -> Option<Event> {
        let read = self.label(r).as_read()?;
        self.co_imm_succ_at(read.rf, read.addr)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Thread create / join
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Create event of a spawned thread's start event
    pub fn tc_pred(&self, e: Event) -> Option<Event> {
        match self.label(e).kind() {
            LabelKind::ThreadStart { create } => *create,
            _ => None,
        }
    }

    /// Start event of the thread a create event spawned
    pub fn tc_succ(&self, e: Event) -> Option<Event> {
        match self.label(e).kind() {
            LabelKind::ThreadCreate { child } => {
                let start = Event::new(*child, 0);
                self.contains(start).then_some(start)
            }
            _ => None,
        }
    }

    /// Finish event of the thread a join waits for, once it exists
    pub fn tj_pred(&self, e: Event) -> Option<Event> {
        match self.label(e).kind() {
            LabelKind::ThreadJoin { child } => self
                .last_thread_label(*child)
                .filter(|l| matches!(l.kind(), LabelKind::ThreadFinish))
                .map(EventLabel::pos),
            _ => None,
        }
    }

    /// Joins waiting for the thread a finish event ends
    pub fn tj_succs(&self, e: Event) -> Vec<Event> {
        if !matches!(self.label(e).kind(), LabelKind::ThreadFinish) {
            return Vec::new();
        }
        self.labels()
            .filter(|l| matches!(l.kind(), LabelKind::ThreadJoin { child } if *child == e.thread))
            .map(EventLabel::pos)
            .collect()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Dependencies
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Data dependencies
    pub fn data_preds(&self, e: Event) -> &[Event] {
        &self.label(e).deps().data
    }

    /// Address dependencies
    pub fn addr_preds(&self, e: Event) -> &[Event] {
        &self.label(e).deps().addr
    }

    /// Control dependencies
    pub fn ctrl_preds(&self, e: Event) -> &[Event] {
        &self.label(e).deps().ctrl
    }

    /// `(coe; rfe) ∩ po` predecessors of a read: same-thread writes that are
    /// coherence-before the external write the read observes.
    pub fn detour_preds(&self, r: Event) -> Vec<Event> {
        let Some(read) = self.label(r).as_read() else {
            return Vec::new();
        };
        let Some(source) = self.rfe_pred(r) else {
            return Vec::new();
        };
        let co = self.co(read.addr);
        let end = if source.is_init() {
            0
        } else {
            co.iter().position(|&e| e == source).unwrap_or(0)
        };
        co[..end]
            .iter()
            .copied()
            .filter(|w| w.thread == r.thread && w.index < r.index)
            .collect()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Locations and allocation lifetime
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Other reads and writes of the same location
    pub fn samelocs(&self, e: Event) -> Vec<Event> {
        let Some(addr) = self.label(e).access_addr() else {
            return Vec::new();
        };
        self.accesses_at(addr)
            .into_iter()
            .filter(|&x| x != e)
            .collect()
    }

    /// Allocation whose block contains the location `e` touches
    pub fn alloc_pred(&self, e: Event) -> Option<Event> {
        let addr = self.label(e).addr()?;
        self.labels()
            .find(|l| match l.kind() {
                LabelKind::Malloc { addr: base, size } => addr.within(*base, *size),
                _ => false,
            })
            .map(EventLabel::pos)
    }

    /// Accesses and frees inside the block an allocation created
    pub fn alloc_succs(&self, m: Event) -> Vec<Event> {
        let LabelKind::Malloc { addr: base, size } = *self.label(m).kind() else {
            return Vec::new();
        };
        self.labels()
            .filter(|l| {
                let inside = l.addr().is_some_and(|a| a.within(base, size));
                inside && (l.is_access() || matches!(l.kind(), LabelKind::Free { .. }))
            })
            .map(EventLabel::pos)
            .collect()
    }

    /// All frees of the block an allocation created, in stamp order
    pub fn frees_of(&self, m: Event) -> Vec<Event> {
        let LabelKind::Malloc { addr: base, size } = *self.label(m).kind() else {
            return Vec::new();
        };
        self.labels()
            .filter(|l| match l.kind() {
                LabelKind::Free { addr, .. } => addr.within(base, size),
                _ => false,
            })
            .map(EventLabel::pos)
            .collect()
    }

    /// First free of the block an allocation created
    pub fn free_succ(&self, m: Event) -> Option<Event> {
        self.frees_of(m).first().copied()
    }

    /// First free of the block containing the location `e` touches,
    /// other than `e` itself
    pub fn free_pred(&self, e: Event) -> Option<Event> {
        let alloc = self.alloc_pred(e)?;
        self.frees_of(alloc).into_iter().find(|&f| f != e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{CoPlacement, Deps, MemOrdering, RmwKind, ThreadId};

    const X: Addr = Addr::global(0);
    const RLX: MemOrdering = MemOrdering::Relaxed;

    #[test]
    fn test_po() {
        let mut g = ExecutionGraph::new();
        let a = g.add_fence(ThreadId::MAIN, RLX);
        let b = g.add_fence(ThreadId::MAIN, RLX);
        assert_eq!(g.po_imm_pred(a), None);
        assert_eq!(g.po_imm_pred(b), Some(a));
        assert_eq!(g.po_imm_succ(a), Some(b));
        assert_eq!(g.po_imm_succ(b), None);
        assert_eq!(g.po_imm_succ(Event::INIT), None);
        assert_eq!(g.po_preds(b).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_co_and_fr() {
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let w1 = g.add_write(ThreadId::MAIN, X, RLX, CoPlacement::Max);
        let w2 = g.add_write(t1, X, RLX, CoPlacement::Max);
        let r = g.add_read(t1, X, RLX, Event::INIT);

        assert_eq!(g.co_imm_pred(w1), Some(Event::INIT));
        assert_eq!(g.co_imm_pred(w2), Some(w1));
        assert_eq!(g.co_imm_succ(w1), Some(w2));
        assert_eq!(g.co_succs(w1), &[w2]);
        assert_eq!(g.co_preds(w2), vec![Event::INIT, w1]);
        assert_eq!(g.fr_imm_preds(w1), vec![r]);
        assert_eq!(g.fr_imm_succ(r), Some(w1));
        assert_eq!(g.rf_succs(Event::INIT), vec![r]);
    }

    #[test]
    fn test_rfi_rfe() {
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let w = g.add_write(t1, X, RLX, CoPlacement::Max);
        let ri = g.add_read(t1, X, RLX, w);
        let re = g.add_read(ThreadId::MAIN, X, RLX, w);
        assert_eq!(g.rfi_pred(ri), Some(w));
        assert_eq!(g.rfe_pred(ri), None);
        assert_eq!(g.rfe_pred(re), Some(w));
        assert_eq!(g.poloc_imm_pred(ri), Some(w));
        assert_eq!(g.poloc_imm_succ(w), Some(ri));
    }

    #[test]
    fn test_thread_edges() {
        let mut g = ExecutionGraph::new();
        let (create, child) = g.create_thread(ThreadId::MAIN);
        let start = Event::new(child, 0);
        assert_eq!(g.tc_pred(start), Some(create));
        assert_eq!(g.tc_succ(create), Some(start));
        let join = g.join_thread(ThreadId::MAIN, child);
        assert_eq!(g.tj_pred(join), None);
        let finish = g.finish_thread(child);
        assert_eq!(g.tj_pred(join), Some(finish));
        assert_eq!(g.tj_succs(finish), vec![join]);
    }

    #[test]
    fn test_detour() {
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let own = g.add_write(ThreadId::MAIN, X, RLX, CoPlacement::Max);
        let other = g.add_write(t1, X, RLX, CoPlacement::Max);
        let r = g.add_read(ThreadId::MAIN, X, RLX, other);
        assert_eq!(g.detour_preds(r), vec![own]);
    }

    #[test]
    fn test_deps() {
        let mut g = ExecutionGraph::new();
        let r = g.add_read(ThreadId::MAIN, X, RLX, Event::INIT);
        let w = g.add_write(ThreadId::MAIN, Addr::global(8), RLX, CoPlacement::Max);
        let mut deps = Deps::default();
        deps.data.push(r);
        g.set_deps(w, deps);
        assert_eq!(g.data_preds(w), &[r]);
        assert!(g.addr_preds(w).is_empty());
        assert!(g.ctrl_preds(w).is_empty());
    }

    #[test]
    fn test_allocation_lifetime() {
        let mut g = ExecutionGraph::new();
        let base = Addr::heap(0x100);
        let m = g.add_malloc(ThreadId::MAIN, base, 16);
        let w = g.add_write(ThreadId::MAIN, Addr::heap(0x108), RLX, CoPlacement::Max);
        let f = g.add_free(ThreadId::MAIN, base);
        assert_eq!(g.alloc_pred(w), Some(m));
        assert_eq!(g.alloc_succs(m), vec![w, f]);
        assert_eq!(g.free_succ(m), Some(f));
        assert_eq!(g.free_pred(w), Some(f));
        assert_eq!(g.free_pred(f), None);
    }

    #[test]
    fn test_rmw_fr_includes_own_read() {
        let mut g = ExecutionGraph::new();
        let r = g.add_rmw_read(ThreadId::MAIN, X, RLX, Event::INIT, RmwKind::FetchOp);
        let w = g.add_rmw_write(ThreadId::MAIN, RLX);
        assert_eq!(g.fr_imm_preds(w), vec![r]);
        assert_eq!(g.samelocs(r), vec![w]);
    }
}
