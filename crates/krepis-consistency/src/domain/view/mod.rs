//! Views (vector clocks)
//!
//! # Overview
//!
//! Every label carries one dense [`View`] per relation its checker tracks
//! (typically happens-before) and a [`PrefixView`], its causal prefix.
//! Checkers join the views of an event's immediate predecessors to obtain
//! its own, so views are computed once per label in insertion order.
//!
//! ```text
//! ┌──────────────┐      ┌──────────────┐
//! │ View         │      │ DepView      │
//! ├──────────────┤      ├──────────────┤
//! │ per-thread   │      │ View + holes │  (dependency tracking)
//! │ max index    │      └──────────────┘
//! └──────────────┘              │
//!         └───────┬─────────────┘
//!          ┌──────────────┐
//!          │ PrefixView   │  Porf(View) | Pporf(DepView)
//!          └──────────────┘
//! ```

pub mod dep_view;
pub mod prefix;
pub mod vector_clock;

#[cfg(kani)]
mod proofs;

pub use dep_view::DepView;
pub use prefix::PrefixView;
pub use vector_clock::{VectorClock, View, INLINE_THREADS};
