//! Sequential consistency
//!
//! ```text
//! acyclic(po | rf | co | fr | tc | tj)
//! ```
//!
//! Happens-before is porf.

use super::config::CheckerConfig;
use super::core::{Axiom, CheckerCore};
use super::derived::{porf_step, sc_order};
use super::ConsistencyChecker;

/// Checker for SC
#[derive(Debug)]
pub struct ScChecker {
    core: CheckerCore,
}

impl ScChecker {
    /// Compile the SC table
    pub fn new(config: &CheckerConfig) -> Self {
        let axioms = vec![Axiom::acyclic("sc", &sc_order()), Axiom::atomicity()];
        Self {
            core: CheckerCore::new(config.clone(), &[porf_step()], &porf_step(), false, axioms),
        }
    }
}

impl ConsistencyChecker for ScChecker {
    fn core(&self) -> &CheckerCore {
        &self.core
    }
}
