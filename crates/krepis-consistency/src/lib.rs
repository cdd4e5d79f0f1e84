//! Krepis Consistency Core
//!
//! # Overview
//!
//! `krepis-consistency` is the consistency-checking core of a stateless
//! model checker for concurrent programs. Given an execution graph (events
//! related by program order, reads-from and coherence) it decides whether
//! the graph is consistent under one of five memory models, and answers the
//! scheduling queries the exploration driver asks on every event:
//!
//! - which writes a read may observe ([`ConsistencyChecker::coherent_stores`])
//! - where a write may go in coherence ([`ConsistencyChecker::coherent_placings`])
//! - which reads a write may revisit ([`ConsistencyChecker::coherent_revisits`])
//!
//! # Trinity Architecture
//!
//! - **Domain**: graphs, views, the relation algebra, the traversal engine
//!   and the per-model checkers
//! - **Infrastructure**: litmus files (JSON execution graphs)
//! - **Adapters**: [`InstrumentedChecker`], a statistics and tracing decorator
//!
//! # Memory Models
//!
//! | Model | Happens-before | Prefix | Axioms |
//! |-------|----------------|--------|--------|
//! | SC    | porf           | porf   | sc, atomicity |
//! | TSO   | porf           | porf   | coherence, tso, atomicity |
//! | RA    | porf           | porf   | coherence, atomicity, porf |
//! | RC11  | po, sw         | porf   | coherence, atomicity, no-thin-air, psc |
//! | IMM   | po, sw         | pporf  | coherence, atomicity, ar |
//!
//! # Usage
//!
//! ```rust
//! use krepis_consistency::{
//!     create, Addr, CheckerConfig, CoPlacement, ConsistencyChecker, Event, ExecutionGraph,
//!     MemOrdering, ModelType, ThreadId,
//! };
//!
//! let checker = create(&CheckerConfig::new(ModelType::Sc));
//! let mut g = ExecutionGraph::new();
//! let (_, t1) = g.create_thread(ThreadId::MAIN);
//! checker.update_all_views(&mut g);
//!
//! let x = Addr::global(0);
//! let w = g.add_write(ThreadId::MAIN, x, MemOrdering::SeqCst, CoPlacement::Max);
//! checker.update_mm_views(&mut g, w);
//! assert!(checker.is_consistent(&g, w));
//!
//! let r = g.add_read(t1, x, MemOrdering::SeqCst, Event::INIT);
//! checker.update_mm_views(&mut g, r);
//! assert!(checker.is_consistent(&g, r));
//! assert_eq!(checker.coherent_stores(&g, r), vec![Event::INIT, w]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// Trinity Architecture Layers
pub mod domain;
pub mod infrastructure;
pub mod adapters;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// Checkers
pub use domain::{
    create,
    try_create,
    CheckerConfig,
    CheckerConfigBuilder,
    ConfigError,
    ConsistencyChecker,
    ErrorKind,
    ModelType,
    VerificationError,
};

// Graphs
pub use domain::{
    Addr,
    CoPlacement,
    Deps,
    Event,
    EventLabel,
    ExecutionGraph,
    FreeKind,
    LabelKind,
    MemOrdering,
    RmwKind,
    Stamp,
    ThreadId,
};

// Views
pub use domain::{DepView, PrefixView, VectorClock, View};

// Litmus files and instrumentation
pub use adapters::{CheckerStats, InstrumentedChecker};
pub use infrastructure::{LitmusError, LitmusGraph, LitmusTest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defined() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_every_model_has_a_checker() {
        for model in ModelType::ALL {
            assert_eq!(create(&CheckerConfig::new(model)).model(), model);
        }
    }
}
