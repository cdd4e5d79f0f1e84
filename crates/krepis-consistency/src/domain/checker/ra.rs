//! Release/acquire
//!
//! Every access behaves as release/acquire, so happens-before is porf.
//!
//! ```text
//! acyclic(hb|loc | rf | co | fr)
//! acyclic(po | rf)
//! ```

use super::config::CheckerConfig;
use super::core::{Axiom, CheckerCore};
use super::derived::{coherence, porf_step, HB_VIEW};
use super::ConsistencyChecker;

/// Checker for RA
#[derive(Debug)]
pub struct RaChecker {
    core: CheckerCore,
}

impl RaChecker {
    /// Compile the RA table
    pub fn new(config: &CheckerConfig) -> Self {
        let axioms = vec![
            Axiom::acyclic("coherence", &coherence(HB_VIEW)),
            Axiom::atomicity(),
            Axiom::acyclic("porf", &porf_step()),
        ];
        Self {
            core: CheckerCore::new(config.clone(), &[porf_step()], &porf_step(), false, axioms),
        }
    }
}

impl ConsistencyChecker for RaChecker {
    fn core(&self) -> &CheckerCore {
        &self.core
    }
}
