//! Intermediate memory model
//!
//! Happens-before as in RC11. Instead of forbidding porf cycles, IMM
//! forbids cycles in `ar`, which only orders a read before a later write
//! when a dependency (or a barrier) forces it:
//!
//! ```text
//! acyclic(hb|loc | rf | co | fr)
//! acyclic(ar)
//!
//! ar   = rfe | bob | ppo | detour | psc_F | [W_rmw]; po
//! bob  = po; [W_rel] | [R_acq]; po | po; [F] | [F]; po | [W_rel]; po|loc; [W]
//! deps = data | ctrl | addr; po? | [R_rmw]; po
//! ppo  = [R]; (deps | rfi)+; [W]
//! ```
//!
//! The causal prefix follows preserved program order only, so prefixes are
//! hole-aware.

use super::config::CheckerConfig;
use super::core::{Axiom, CheckerCore};
use super::derived::{coherence, eco, hb, hb_step, po, rmw, sc_fence, HB_VIEW};
use super::ConsistencyChecker;
use crate::domain::relation::{alt, seq, step, test, Guard, Rel, Step};

/// Checker for IMM
#[derive(Debug)]
pub struct ImmChecker {
    core: CheckerCore,
}

fn release_write() -> Guard {
    Guard::Write.and(Guard::AtLeastRelease)
}

fn acquire_read() -> Guard {
    Guard::Read.and(Guard::AtLeastAcquire)
}

/// Barrier-ordered-before
fn bob() -> Rel {
    alt([
        seq([po(), test(release_write())]),
        seq([test(acquire_read()), po()]),
        seq([po(), test(Guard::Fence)]),
        seq([test(Guard::Fence), po()]),
        seq([
            test(release_write()),
            step(Step::PoLocImm).plus(),
            test(Guard::Write),
        ]),
    ])
}

fn deps() -> Rel {
    alt([
        step(Step::Data),
        step(Step::Ctrl),
        seq([step(Step::Addr), po().opt()]),
        seq([test(Guard::RmwRead), po()]),
    ])
}

/// Preserved program order
fn ppo() -> Rel {
    seq([
        test(Guard::Read),
        alt([deps(), step(Step::Rfi)]).plus(),
        test(Guard::Write),
    ])
}

fn psc_fence() -> Rel {
    seq([
        test(sc_fence()),
        hb(),
        seq([eco(), hb()]).opt(),
        test(sc_fence()),
    ])
}

fn ar() -> Rel {
    alt([
        step(Step::Rfe),
        bob(),
        ppo(),
        step(Step::Detour),
        psc_fence(),
        seq([test(Guard::RmwWrite), po()]),
    ])
}

/// One step of the preserved causal prefix
fn pporf_step() -> Rel {
    alt([
        step(Step::Data),
        step(Step::Addr),
        step(Step::Ctrl),
        step(Step::Rf),
        step(Step::Tc),
        step(Step::Tj),
        rmw(),
        seq([
            po(),
            test(Guard::Or(vec![
                Guard::Fence,
                release_write(),
                Guard::ThreadEvent,
            ])),
        ]),
        seq([
            test(Guard::Or(vec![
                acquire_read(),
                Guard::Fence.and(Guard::AtLeastAcquire),
            ])),
            po(),
        ]),
        seq([step(Step::Addr), po()]),
    ])
}

impl ImmChecker {
    /// Compile the IMM table
    pub fn new(config: &CheckerConfig) -> Self {
        let axioms = vec![
            Axiom::acyclic("coherence", &coherence(HB_VIEW)),
            Axiom::atomicity(),
            Axiom::acyclic("ar", &ar()),
        ];
        Self {
            core: CheckerCore::new(config.clone(), &[hb_step()], &pporf_step(), true, axioms),
        }
    }
}

impl ConsistencyChecker for ImmChecker {
    fn core(&self) -> &CheckerCore {
        &self.core
    }
}
