//! Execution graphs
//!
//! Events, their labels, the graph that owns them and the primitive
//! relations between them.

pub mod event;
pub mod execution_graph;
pub mod label;
pub mod relations;

pub use event::{Addr, Deps, Event, FreeKind, MemOrdering, RmwKind, Stamp, ThreadId};
pub use execution_graph::{CoPlacement, ExecutionGraph};
pub use label::{EventLabel, LabelKind, ReadAccess, WriteAccess};
