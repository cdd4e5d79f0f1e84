//! Shared traversal engine
//!
//! Runs compiled relation automata over an execution graph. There are two
//! traversals:
//!
//! - [`calc_view`]: join the stored views of all predecessors of an event
//! - [`has_cycle`] / [`has_cycle_through`]: acyclicity of a derived relation
//!
//! Both are iterative and use a [`TraversalContext`] for their scratch
//! state, so deep graphs never grow the call stack and one checker can
//! serve several threads through a [`ScratchPool`].

pub mod acyclic;
pub mod calc;
pub mod context;

pub use acyclic::{has_cycle, has_cycle_through};
pub use calc::calc_view;
pub use context::{NodeStatus, ScratchGuard, ScratchPool, TraversalContext};
