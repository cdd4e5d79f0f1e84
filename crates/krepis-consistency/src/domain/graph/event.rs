//! Core Types for Execution Graphs
//!
//! Event identity, insertion stamps, memory addresses and access metadata.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Thread identifier
///
/// Thread 0 is the main thread; it also hosts the initializer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(pub u32);

impl ThreadId {
    /// The main thread
    pub const MAIN: Self = Self(0);

    /// Create a new thread identifier
    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the underlying value as an index
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Position of an event: its thread and its index in program order
///
/// Events are never recycled. `Event::INIT` is the initializer, which
/// behaves as the coherence-minimal write to every location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Event {
    /// Owning thread
    pub thread: ThreadId,
    /// Index in the thread's program order
    pub index: u32,
}

impl Event {
    /// The initializer event
    pub const INIT: Self = Self::new(ThreadId::MAIN, 0);

    /// Create a new event position
    #[inline(always)]
    pub const fn new(thread: ThreadId, index: u32) -> Self {
        Self { thread, index }
    }

    /// Whether this is the initializer
    #[inline(always)]
    pub const fn is_init(self) -> bool {
        self.thread.0 == 0 && self.index == 0
    }

    /// The position immediately before this one in the same thread
    #[inline]
    pub const fn prev(self) -> Option<Self> {
        if self.index == 0 {
            None
        } else {
            Some(Self::new(self.thread, self.index - 1))
        }
    }

    /// The position immediately after this one in the same thread
    #[inline]
    pub const fn next(self) -> Self {
        Self::new(self.thread, self.index + 1)
    }

    /// Whether `self` and `other` are in different threads.
    ///
    /// The initializer is external to every event.
    #[inline]
    pub const fn is_external_to(self, other: Self) -> bool {
        self.is_init() || other.is_init() || self.thread.0 != other.thread.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_init() {
            write!(f, "INIT")
        } else {
            write!(f, "({}, {})", self.thread, self.index)
        }
    }
}

/// Insertion-order timestamp of a label
///
/// Stamps are dense and strictly increasing, so they double as indices
/// into per-traversal scratch arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stamp(pub u32);

impl Stamp {
    /// Get the underlying value as an index
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Memory address
///
/// The high bit distinguishes dynamically allocated (heap) memory from
/// static memory. Only heap accesses are subject to allocation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Addr(pub u64);

impl Addr {
    const HEAP_BIT: u64 = 1 << 63;

    /// A static (global) address
    #[inline]
    pub const fn global(offset: u64) -> Self {
        Self(offset & !Self::HEAP_BIT)
    }

    /// A dynamically allocated address
    #[inline]
    pub const fn heap(offset: u64) -> Self {
        Self(offset | Self::HEAP_BIT)
    }

    /// Whether the address belongs to dynamic memory
    #[inline]
    pub const fn is_heap(self) -> bool {
        self.0 & Self::HEAP_BIT != 0
    }

    /// Offset within its address space
    #[inline]
    pub const fn offset(self) -> u64 {
        self.0 & !Self::HEAP_BIT
    }

    /// Whether `self` lies in `[base, base + size)`
    #[inline]
    pub const fn within(self, base: Self, size: u64) -> bool {
        self.is_heap() == base.is_heap()
            && self.offset() >= base.offset()
            && self.offset() - base.offset() < size
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let space = if self.is_heap() { "heap" } else { "global" };
        write!(f, "{}:{:#x}", space, self.offset())
    }
}

/// Ordering strength of an access or fence
///
/// Variants are declared weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemOrdering {
    /// Plain, non-atomic access
    #[serde(alias = "na")]
    NotAtomic,
    /// Relaxed atomic
    #[serde(alias = "rlx")]
    Relaxed,
    /// Acquire
    #[serde(alias = "acq")]
    Acquire,
    /// Release
    #[serde(alias = "rel")]
    Release,
    /// Acquire and release
    #[serde(alias = "acqrel")]
    AcqRel,
    /// Sequentially consistent
    #[serde(alias = "sc")]
    SeqCst,
}

impl MemOrdering {
    /// Whether the access is atomic
    #[inline]
    pub const fn is_atomic(self) -> bool {
        !matches!(self, Self::NotAtomic)
    }

    /// Acquire, acq-rel or SC
    #[inline]
    pub const fn is_at_least_acquire(self) -> bool {
        matches!(self, Self::Acquire | Self::AcqRel | Self::SeqCst)
    }

    /// Release, acq-rel or SC
    #[inline]
    pub const fn is_at_least_release(self) -> bool {
        matches!(self, Self::Release | Self::AcqRel | Self::SeqCst)
    }

    /// Sequentially consistent
    #[inline]
    pub const fn is_sc(self) -> bool {
        matches!(self, Self::SeqCst)
    }
}

impl fmt::Display for MemOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotAtomic => "na",
            Self::Relaxed => "rlx",
            Self::Acquire => "acq",
            Self::Release => "rel",
            Self::AcqRel => "acq_rel",
            Self::SeqCst => "sc",
        };
        f.write_str(s)
    }
}

/// Flavour of a read-modify-write pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RmwKind {
    /// Fetch-and-op (add, sub, or, ...)
    FetchOp,
    /// Unconditional exchange
    Exchange,
    /// Successful compare-and-swap
    Cas,
    /// Lock acquisition implemented as a CAS
    LockCas,
}

/// How a block of memory is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeKind {
    /// Immediate deallocation
    Free,
    /// Retirement through a hazard-pointer domain
    HpRetire,
}

/// Per-instruction dependencies of an event
///
/// Only populated when the interpreter tracks dependencies. Control
/// dependencies accumulate: an event carries every branch condition that
/// was evaluated before it in its thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deps {
    /// Events whose values flow into this event's value
    pub data: SmallVec<[Event; 2]>,
    /// Events whose values flow into this event's address
    pub addr: SmallVec<[Event; 2]>,
    /// Events whose values decided a branch before this event
    pub ctrl: SmallVec<[Event; 2]>,
}

impl Deps {
    /// Whether no dependency is recorded
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.addr.is_empty() && self.ctrl.is_empty()
    }
}
