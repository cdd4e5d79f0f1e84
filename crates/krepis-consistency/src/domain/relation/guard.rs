//! Node guards
//!
//! A guard is a test on a single label (`[W]`, `[F_sc]`, ...). Guards never
//! hold on the initializer except `Any`.

use crate::domain::graph::{EventLabel, ExecutionGraph};

/// Label predicate used as an identity-restricted relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Every label
    Any,
    /// Reads
    Read,
    /// Writes
    Write,
    /// Fences
    Fence,
    /// Reads and writes
    Access,
    /// Read half of an RMW
    RmwRead,
    /// Write half of an RMW
    RmwWrite,
    /// Reads that are not part of an RMW
    PlainRead,
    /// Writes that are not part of an RMW
    PlainWrite,
    /// Atomic accesses and fences
    Atomic,
    /// Non-atomic accesses
    NotAtomic,
    /// Acquire-or-stronger
    AtLeastAcquire,
    /// Release-or-stronger
    AtLeastRelease,
    /// Sequentially consistent
    Sc,
    /// Thread create, start, join and finish
    ThreadEvent,
    /// Events inside a library method
    InMethod,
    /// Negation
    Not(Box<Guard>),
    /// Conjunction
    And(Vec<Guard>),
    /// Disjunction
    Or(Vec<Guard>),
}

impl Guard {
    /// Conjunction with `other`
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut gs) => {
                gs.push(other);
                Self::And(gs)
            }
            g => Self::And(vec![g, other]),
        }
    }

    /// Disjunction with `other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut gs) => {
                gs.push(other);
                Self::Or(gs)
            }
            g => Self::Or(vec![g, other]),
        }
    }

    /// Negation
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Whether the guard holds on `lab`
    pub fn holds(&self, g: &ExecutionGraph, lab: &EventLabel) -> bool {
        if lab.is_init() {
            return match self {
                Self::Any => true,
                Self::Not(inner) => !inner.holds(g, lab),
                Self::And(gs) => gs.iter().all(|x| x.holds(g, lab)),
                Self::Or(gs) => gs.iter().any(|x| x.holds(g, lab)),
                _ => false,
            };
        }
        match self {
            Self::Any => true,
            Self::Read => lab.is_read(),
            Self::Write => lab.is_write(),
            Self::Fence => lab.is_fence(),
            Self::Access => lab.is_access(),
            Self::RmwRead => lab.is_rmw_read(),
            Self::RmwWrite => lab.is_rmw_write(),
            Self::PlainRead => lab.is_read() && !lab.is_rmw_read(),
            Self::PlainWrite => lab.is_write() && !lab.is_rmw_write(),
            Self::Atomic => lab.is_atomic(),
            Self::NotAtomic => lab.is_not_atomic(),
            Self::AtLeastAcquire => lab.is_at_least_acquire(),
            Self::AtLeastRelease => lab.is_at_least_release(),
            Self::Sc => lab.is_sc(),
            Self::ThreadEvent => lab.is_thread_event(),
            Self::InMethod => g.enclosing_method(lab.pos()).is_some(),
            Self::Not(inner) => !inner.holds(g, lab),
            Self::And(gs) => gs.iter().all(|x| x.holds(g, lab)),
            Self::Or(gs) => gs.iter().any(|x| x.holds(g, lab)),
        }
    }
}
