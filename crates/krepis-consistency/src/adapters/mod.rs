//! Adapters Layer - Ports & Adapters Pattern
//!
//! Decorators around [`ConsistencyChecker`](crate::ConsistencyChecker)
//! that add behaviour without touching the model tables.

pub mod instrumented;

pub use instrumented::{CheckerStats, InstrumentedChecker};
