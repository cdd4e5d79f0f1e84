//! Total store order
//!
//! ```text
//! acyclic(po|loc | rf | co | fr)
//! acyclic(ppo | rfe | co | fr | tc | tj)
//! ppo = po \ ([W]; po; [R])
//! ```
//!
//! RMWs, SC fences and thread events act as full barriers: only plain
//! writes followed by plain reads may be reordered.

use super::config::CheckerConfig;
use super::core::{Axiom, CheckerCore};
use super::derived::{po, po_loc_coherence, porf_step, sc_fence};
use super::ConsistencyChecker;
use crate::domain::relation::{alt, seq, step, test, Guard, Rel, Step};

/// Checker for TSO
#[derive(Debug)]
pub struct TsoChecker {
    core: CheckerCore,
}

fn memory_event() -> Guard {
    Guard::Or(vec![
        Guard::Read,
        Guard::Write,
        sc_fence(),
        Guard::ThreadEvent,
    ])
}

/// Preserved program order
fn ppo() -> Rel {
    alt([
        seq([
            test(memory_event().and(Guard::PlainWrite.not())),
            po(),
            test(memory_event()),
        ]),
        seq([
            test(memory_event()),
            po(),
            test(memory_event().and(Guard::PlainRead.not())),
        ]),
    ])
}

fn tso_order() -> Rel {
    alt([
        ppo(),
        step(Step::Rfe),
        step(Step::CoImm),
        step(Step::FrImm),
        step(Step::Tc),
        step(Step::Tj),
    ])
}

impl TsoChecker {
    /// Compile the TSO table
    pub fn new(config: &CheckerConfig) -> Self {
        let axioms = vec![
            Axiom::acyclic("coherence", &po_loc_coherence()),
            Axiom::acyclic("tso", &tso_order()),
            Axiom::atomicity(),
        ];
        Self {
            core: CheckerCore::new(config.clone(), &[porf_step()], &porf_step(), false, axioms),
        }
    }
}

impl ConsistencyChecker for TsoChecker {
    fn core(&self) -> &CheckerCore {
        &self.core
    }
}
