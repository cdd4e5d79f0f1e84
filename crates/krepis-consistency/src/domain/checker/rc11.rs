//! Repaired C11
//!
//! Happens-before is `(po | sw | tc | tj)+` with release sequences and
//! fence synchronisation.
//!
//! ```text
//! acyclic(hb|loc | rf | co | fr)        coherence
//! acyclic(po | rf)                      no thin air
//! acyclic(psc_base | psc_F)             SC
//!
//! scb      = po | po|≠loc; hb; po|≠loc | hb|loc | co | fr
//! psc_base = ([E_sc] | [F_sc]; hb?); scb; ([E_sc] | hb?; [F_sc])
//! psc_F    = [F_sc]; (hb | hb; eco; hb); [F_sc]
//! ```
//!
//! With library refinement enabled a second view tracks
//! happens-before in which reads inside library methods synchronise with
//! the writes they observe.

use super::config::CheckerConfig;
use super::core::{Axiom, CheckerCore};
use super::derived::{
    coherence, eco, hb, hb_relinche_step, hb_step, po, porf_step, sc_fence, HB_RELINCHE_VIEW,
    HB_VIEW,
};
use super::ConsistencyChecker;
use crate::domain::graph::{Event, ExecutionGraph};
use crate::domain::relation::{alt, seq, step, test, Automaton, Guard, Rel, Step};
use crate::domain::view::View;

/// Checker for RC11
#[derive(Debug)]
pub struct Rc11Checker {
    core: CheckerCore,
    relinche: Option<Automaton>,
}

fn scb() -> Rel {
    alt([
        po(),
        seq([step(Step::PoDiffLoc), hb(), step(Step::PoDiffLoc)]),
        step(Step::HbLoc(HB_VIEW)),
        step(Step::CoImm).plus(),
        seq([step(Step::FrImm), step(Step::CoImm).star()]),
    ])
}

fn psc_base() -> Rel {
    seq([
        alt([
            test(Guard::Sc),
            seq([test(sc_fence()), hb().opt()]),
        ]),
        scb(),
        alt([
            test(Guard::Sc),
            seq([hb().opt(), test(sc_fence())]),
        ]),
    ])
}

fn psc_fence() -> Rel {
    seq([
        test(sc_fence()),
        alt([hb(), seq([hb(), eco(), hb()])]),
        test(sc_fence()),
    ])
}

impl Rc11Checker {
    /// Compile the RC11 table
    pub fn new(config: &CheckerConfig) -> Self {
        let mut views = vec![hb_step()];
        if config.relinche {
            views.push(hb_relinche_step());
        }
        let axioms = vec![
            Axiom::acyclic("coherence", &coherence(HB_VIEW)),
            Axiom::atomicity(),
            Axiom::acyclic("no-thin-air", &porf_step()),
            Axiom::sc_acyclic("psc", &alt([psc_base(), psc_fence()])),
        ];
        let relinche = config
            .relinche
            .then(|| coherence(HB_RELINCHE_VIEW).compile());
        Self {
            core: CheckerCore::new(config.clone(), &views, &porf_step(), false, axioms),
            relinche,
        }
    }

    fn relinche(&self, op: &str) -> &Automaton {
        match &self.relinche {
            Some(automaton) => automaton,
            None => panic!("{op} requires library refinement checking to be enabled"),
        }
    }
}

impl ConsistencyChecker for Rc11Checker {
    fn core(&self) -> &CheckerCore {
        &self.core
    }

    fn is_coherent_relinche(&self, g: &ExecutionGraph) -> bool {
        let automaton = self.relinche("is_coherent_relinche");
        self.core.is_acyclic(g, automaton)
    }

    fn hb_relinche_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        self.relinche("hb_relinche_view");
        g.label(e).view(HB_RELINCHE_VIEW)
    }
}
