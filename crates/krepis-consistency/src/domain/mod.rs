//! Domain Layer
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  checker   ConsistencyChecker, per-model tables,            │
//! │            coherence selection, safety checks               │
//! │     │                                                       │
//! │  engine    calc_view, has_cycle (iterative, pooled scratch) │
//! │     │                                                       │
//! │  relation  Rel ──compile──▶ Automaton (Step, Guard)         │
//! │     │                                                       │
//! │  graph     ExecutionGraph, EventLabel, primitive relations  │
//! │     │                                                       │
//! │  view      View, DepView, PrefixView                        │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every layer only depends on the layers below it.

pub mod checker;
pub mod engine;
pub mod graph;
pub mod relation;
pub mod view;

pub use checker::{
    create, try_create, CheckerConfig, CheckerConfigBuilder, ConfigError, ConsistencyChecker,
    ErrorKind, ModelType, VerificationError,
};
pub use graph::{
    Addr, CoPlacement, Deps, Event, EventLabel, ExecutionGraph, FreeKind, LabelKind,
    MemOrdering, RmwKind, Stamp, ThreadId,
};
pub use view::{DepView, PrefixView, VectorClock, View};
