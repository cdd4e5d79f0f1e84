//! Event labels
//!
//! A label is what the interpreter recorded at an event position: the kind
//! of action, its access metadata, its dependencies and, once the checker
//! has processed it, its views.

use super::event::{Addr, Deps, Event, FreeKind, MemOrdering, RmwKind, Stamp, ThreadId};
use crate::domain::view::{PrefixView, View};

/// Read access metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAccess {
    /// Location read
    pub addr: Addr,
    /// Ordering strength
    pub ordering: MemOrdering,
    /// The write (or the initializer) this read observes
    pub rf: Event,
    /// Set when this read is the first half of an RMW
    pub rmw: Option<RmwKind>,
    /// Whether a later write may still change `rf`
    pub revisitable: bool,
}

/// Write access metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAccess {
    /// Location written
    pub addr: Addr,
    /// Ordering strength
    pub ordering: MemOrdering,
    /// Set when this write is the second half of an RMW
    pub rmw: Option<RmwKind>,
    pub(crate) readers: Vec<Event>,
}

impl WriteAccess {
    /// Reads whose `rf` is this write
    pub fn readers(&self) -> &[Event] {
        &self.readers
    }
}

/// Kind of an event label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelKind {
    /// Initializer: writes the initial value of every location
    Init,
    /// First event of a spawned thread
    ThreadStart {
        /// Creating event in the parent thread (none for the main thread)
        create: Option<Event>,
    },
    /// Spawn of a new thread
    ThreadCreate {
        /// The spawned thread
        child: ThreadId,
    },
    /// Wait for another thread to finish
    ThreadJoin {
        /// The joined thread
        child: ThreadId,
    },
    /// Last event of a thread
    ThreadFinish,
    /// Memory read
    Read(ReadAccess),
    /// Memory write
    Write(WriteAccess),
    /// Memory fence
    Fence {
        /// Ordering strength
        ordering: MemOrdering,
    },
    /// Dynamic allocation of `[addr, addr + size)`
    Malloc {
        /// Base address
        addr: Addr,
        /// Size in bytes
        size: u64,
    },
    /// Deallocation of the block starting at `addr`
    Free {
        /// Base address
        addr: Addr,
        /// Immediate free or hazard-pointer retirement
        kind: FreeKind,
    },
    /// Entry into a library method (refinement checking)
    MethodBegin {
        /// Method name
        name: String,
    },
    /// Exit from a library method
    MethodEnd {
        /// Method name
        name: String,
    },
}

/// An event together with everything recorded about it
#[derive(Debug, Clone)]
pub struct EventLabel {
    pos: Event,
    stamp: Stamp,
    kind: LabelKind,
    deps: Deps,
    views: Vec<View>,
    prefix: Option<PrefixView>,
}

impl EventLabel {
    pub(crate) fn new(pos: Event, stamp: Stamp, kind: LabelKind) -> Self {
        Self {
            pos,
            stamp,
            kind,
            deps: Deps::default(),
            views: Vec::new(),
            prefix: None,
        }
    }

    /// Position in the graph
    #[inline]
    pub const fn pos(&self) -> Event {
        self.pos
    }

    /// Insertion stamp
    #[inline]
    pub const fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Label kind
    #[inline]
    pub const fn kind(&self) -> &LabelKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut LabelKind {
        &mut self.kind
    }

    /// Recorded dependencies
    #[inline]
    pub const fn deps(&self) -> &Deps {
        &self.deps
    }

    pub(crate) fn set_deps(&mut self, deps: Deps) {
        self.deps = deps;
    }

    /// Read metadata, if this is a read
    #[inline]
    pub const fn as_read(&self) -> Option<&ReadAccess> {
        match &self.kind {
            LabelKind::Read(r) => Some(r),
            _ => None,
        }
    }

    /// Write metadata, if this is a write
    #[inline]
    pub const fn as_write(&self) -> Option<&WriteAccess> {
        match &self.kind {
            LabelKind::Write(w) => Some(w),
            _ => None,
        }
    }

    /// Whether this is the initializer
    #[inline]
    pub const fn is_init(&self) -> bool {
        matches!(self.kind, LabelKind::Init)
    }

    /// Whether this is a read
    #[inline]
    pub const fn is_read(&self) -> bool {
        matches!(self.kind, LabelKind::Read(_))
    }

    /// Whether this is a write (the initializer excluded)
    #[inline]
    pub const fn is_write(&self) -> bool {
        matches!(self.kind, LabelKind::Write(_))
    }

    /// Whether this is a fence
    #[inline]
    pub const fn is_fence(&self) -> bool {
        matches!(self.kind, LabelKind::Fence { .. })
    }

    /// Whether this is a read or a write
    #[inline]
    pub const fn is_access(&self) -> bool {
        self.is_read() || self.is_write()
    }

    /// Thread lifecycle events (start, create, join, finish)
    #[inline]
    pub const fn is_thread_event(&self) -> bool {
        matches!(
            self.kind,
            LabelKind::ThreadStart { .. }
                | LabelKind::ThreadCreate { .. }
                | LabelKind::ThreadJoin { .. }
                | LabelKind::ThreadFinish
        )
    }

    /// First half of an RMW
    #[inline]
    pub fn is_rmw_read(&self) -> bool {
        self.as_read().is_some_and(|r| r.rmw.is_some())
    }

    /// Second half of an RMW
    #[inline]
    pub fn is_rmw_write(&self) -> bool {
        self.as_write().is_some_and(|w| w.rmw.is_some())
    }

    /// Location accessed by a read, write, allocation or free
    pub const fn addr(&self) -> Option<Addr> {
        match &self.kind {
            LabelKind::Read(r) => Some(r.addr),
            LabelKind::Write(w) => Some(w.addr),
            LabelKind::Malloc { addr, .. } | LabelKind::Free { addr, .. } => Some(*addr),
            _ => None,
        }
    }

    /// Location of a read or write
    pub const fn access_addr(&self) -> Option<Addr> {
        match &self.kind {
            LabelKind::Read(r) => Some(r.addr),
            LabelKind::Write(w) => Some(w.addr),
            _ => None,
        }
    }

    /// Ordering of an access or fence
    pub const fn ordering(&self) -> Option<MemOrdering> {
        match &self.kind {
            LabelKind::Read(r) => Some(r.ordering),
            LabelKind::Write(w) => Some(w.ordering),
            LabelKind::Fence { ordering } => Some(*ordering),
            _ => None,
        }
    }

    /// Non-atomic access
    pub fn is_not_atomic(&self) -> bool {
        self.is_access() && self.ordering().is_some_and(|o| !o.is_atomic())
    }

    /// Atomic access or fence
    pub fn is_atomic(&self) -> bool {
        self.ordering().is_some_and(MemOrdering::is_atomic)
    }

    /// Acquire-or-stronger access or fence
    pub fn is_at_least_acquire(&self) -> bool {
        self.ordering().is_some_and(MemOrdering::is_at_least_acquire)
    }

    /// Release-or-stronger access or fence
    pub fn is_at_least_release(&self) -> bool {
        self.ordering().is_some_and(MemOrdering::is_at_least_release)
    }

    /// SC access or fence
    pub fn is_sc(&self) -> bool {
        self.ordering().is_some_and(MemOrdering::is_sc)
    }

    /// The write this label reads from
    pub const fn rf(&self) -> Option<Event> {
        match &self.kind {
            LabelKind::Read(r) => Some(r.rf),
            _ => None,
        }
    }

    /// Readers of a write (empty for every other kind)
    pub fn readers(&self) -> &[Event] {
        self.as_write().map_or(&[], WriteAccess::readers)
    }

    /// Whether the checker has attached views
    #[inline]
    pub fn has_views(&self) -> bool {
        !self.views.is_empty()
    }

    /// All attached views, in slot order
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// View in `slot`
    ///
    /// # Panics
    ///
    /// Views are only valid after `update_mm_views` ran on this label.
    pub fn view(&self, slot: usize) -> &View {
        match self.views.get(slot) {
            Some(view) => view,
            None => panic!("view slot {slot} of {} read before update_mm_views", self.pos),
        }
    }

    /// Causal prefix
    ///
    /// # Panics
    ///
    /// Only valid after `update_mm_views` ran on this label.
    pub fn prefix_view(&self) -> &PrefixView {
        match &self.prefix {
            Some(prefix) => prefix,
            None => panic!("prefix view of {} read before update_mm_views", self.pos),
        }
    }

    pub(crate) fn set_views(&mut self, views: Vec<View>, prefix: PrefixView) {
        self.views = views;
        self.prefix = Some(prefix);
    }
}
