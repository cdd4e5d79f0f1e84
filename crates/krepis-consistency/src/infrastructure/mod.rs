//! Infrastructure Layer
//!
//! File formats connecting the domain to the outside world.

pub mod litmus;

pub use litmus::{LitmusError, LitmusEvent, LitmusGraph, LitmusOp, LitmusTest, INIT_ID};
