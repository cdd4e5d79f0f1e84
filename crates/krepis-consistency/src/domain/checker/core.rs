//! Shared checker machinery
//!
//! A model is a table: one relation per tracked view, one relation for the
//! causal prefix, and a list of axioms. [`CheckerCore`] compiles the table
//! once and runs it through the traversal engine.

use super::config::{CheckerConfig, ModelType};
use super::derived::HB_VIEW;
use crate::domain::engine::{calc_view, has_cycle, has_cycle_through, ScratchPool};
use crate::domain::graph::{Event, EventLabel, ExecutionGraph};
use crate::domain::relation::{Automaton, Rel, Step};
use crate::domain::view::{DepView, PrefixView, View};
use tracing::{debug, trace};

/// How an axiom is checked
#[derive(Debug, Clone)]
pub enum AxiomKind {
    /// The relation must be acyclic
    Acyclic {
        /// Compiled relation
        automaton: Automaton,
        /// Skip when the graph has no SC access or fence
        sc_only: bool,
    },
    /// Every RMW write is placed immediately after the write its read
    /// observed
    Atomicity,
}

/// A named consistency axiom
#[derive(Debug, Clone)]
pub struct Axiom {
    name: &'static str,
    kind: AxiomKind,
}

impl Axiom {
    /// `acyclic(rel)`
    ///
    /// # Panics
    ///
    /// If `rel` is nullable; such a relation relates events to themselves.
    pub fn acyclic(name: &'static str, rel: &Rel) -> Self {
        assert!(!rel.is_nullable(), "acyclicity axiom {name} over a nullable relation");
        Self {
            name,
            kind: AxiomKind::Acyclic {
                automaton: rel.compile(),
                sc_only: false,
            },
        }
    }

    /// `acyclic(rel)`, where every edge of `rel` starts and ends at an SC event
    pub fn sc_acyclic(name: &'static str, rel: &Rel) -> Self {
        let mut axiom = Self::acyclic(name, rel);
        if let AxiomKind::Acyclic { sc_only, .. } = &mut axiom.kind {
            *sc_only = true;
        }
        axiom
    }

    /// RMW atomicity
    pub const fn atomicity() -> Self {
        Self {
            name: "atomicity",
            kind: AxiomKind::Atomicity,
        }
    }

    /// Axiom name used in diagnostics
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Check kind
    pub const fn kind(&self) -> &AxiomKind {
        &self.kind
    }
}

/// Compiled model table plus scratch state
#[derive(Debug)]
pub struct CheckerCore {
    config: CheckerConfig,
    views: Vec<Automaton>,
    prefix: Automaton,
    dep_tracking: bool,
    axioms: Vec<Axiom>,
    pool: ScratchPool,
}

impl CheckerCore {
    /// Compile a model table
    ///
    /// `views[i]` is the one-step relation whose closure is stored in view
    /// slot `i`; `prefix` is the one-step relation of the causal prefix.
    pub fn new(
        config: CheckerConfig,
        views: &[Rel],
        prefix: &Rel,
        dep_tracking: bool,
        axioms: Vec<Axiom>,
    ) -> Self {
        Self {
            config,
            views: views.iter().map(Rel::compile).collect(),
            prefix: prefix.compile(),
            dep_tracking,
            axioms,
            pool: ScratchPool::new(),
        }
    }

    /// Configuration the checker was created from
    pub const fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Memory model
    pub const fn model(&self) -> ModelType {
        self.config.model
    }

    /// Whether prefixes are hole-aware
    pub const fn is_dep_tracking(&self) -> bool {
        self.dep_tracking
    }

    /// Axioms in evaluation order
    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    /// Number of view slots per label
    pub fn num_views(&self) -> usize {
        self.views.len()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Views
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// View in `slot` of `e`, computed from its predecessors' stored views
    pub fn calculate_view(&self, g: &ExecutionGraph, e: Event, slot: usize) -> View {
        let mut ctx = self.pool.acquire();
        calc_view(g, &self.views[slot], &mut ctx, e, View::new(), |lab| {
            lab.view(slot)
        })
    }

    /// Causal prefix of `e`
    pub fn calculate_prefix_view(&self, g: &ExecutionGraph, e: Event) -> PrefixView {
        let mut ctx = self.pool.acquire();
        if self.dep_tracking {
            let view = calc_view(g, &self.prefix, &mut ctx, e, DepView::new(), |lab| {
                match lab.prefix_view() {
                    PrefixView::Pporf(view) => view,
                    PrefixView::Porf(_) => panic!("dense prefix stored at {}", lab.pos()),
                }
            });
            PrefixView::Pporf(view)
        } else {
            let view = calc_view(g, &self.prefix, &mut ctx, e, View::new(), |lab| {
                lab.prefix_view().as_view()
            });
            PrefixView::Porf(view)
        }
    }

    /// Compute and attach all views of `e`
    pub fn update_mm_views(&self, g: &mut ExecutionGraph, e: Event) {
        if e.is_init() {
            return;
        }
        let graph: &ExecutionGraph = g;
        let views: Vec<View> = (0..self.views.len())
            .map(|slot| self.calculate_view(graph, e, slot))
            .collect();
        let prefix = self.calculate_prefix_view(graph, e);
        g.label_mut(e).set_views(views, prefix);
    }

    /// Recompute the views of every label, predecessors first
    pub fn update_all_views(&self, g: &mut ExecutionGraph) {
        for e in porf_order(g) {
            self.update_mm_views(g, e);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Consistency
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Incremental check of `e`
    pub fn is_consistent(&self, g: &ExecutionGraph, e: Event) -> bool {
        self.axioms.iter().all(|axiom| {
            let ok = self.holds_at(g, axiom, g.label(e));
            if !ok {
                debug!(model = %self.model(), axiom = axiom.name(), event = %e, "axiom violated");
            }
            ok
        })
    }

    /// Full check of every axiom
    pub fn is_graph_consistent(&self, g: &ExecutionGraph) -> bool {
        self.first_violation(g).is_none()
    }

    /// Name of the first axiom `g` violates
    pub fn first_violation(&self, g: &ExecutionGraph) -> Option<&'static str> {
        let violated = self
            .axioms
            .iter()
            .find(|axiom| !self.holds(g, axiom))
            .map(Axiom::name);
        if let Some(name) = violated {
            debug!(model = %self.model(), axiom = name, "graph violates axiom");
        }
        violated
    }

    /// Acyclicity of `rel` over the whole graph, outside any model table
    pub fn is_acyclic(&self, g: &ExecutionGraph, automaton: &Automaton) -> bool {
        let mut ctx = self.pool.acquire();
        !has_cycle(g, automaton, &mut ctx)
    }

    fn holds(&self, g: &ExecutionGraph, axiom: &Axiom) -> bool {
        match &axiom.kind {
            AxiomKind::Acyclic { automaton, sc_only } => {
                if *sc_only && !g.has_sc_events() {
                    return true;
                }
                self.is_acyclic(g, automaton)
            }
            AxiomKind::Atomicity => g
                .labels()
                .filter(|l| l.is_rmw_write())
                .all(|l| is_atomic_rmw(g, l.pos())),
        }
    }

    fn holds_at(&self, g: &ExecutionGraph, axiom: &Axiom, lab: &EventLabel) -> bool {
        match &axiom.kind {
            AxiomKind::Acyclic { automaton, sc_only } => {
                if *sc_only && !g.has_sc_events() {
                    trace!(axiom = axiom.name(), "no SC events, skipped");
                    return true;
                }
                if Step::is_sink(automaton.steps(), g, lab) {
                    trace!(axiom = axiom.name(), event = %lab.pos(), "sink, skipped");
                    return true;
                }
                let mut ctx = self.pool.acquire();
                !has_cycle_through(g, automaton, &mut ctx, lab.pos())
            }
            AxiomKind::Atomicity => {
                let e = lab.pos();
                let own = !lab.is_rmw_write() || is_atomic_rmw(g, e);
                let next = g
                    .co_imm_succ(e)
                    .filter(|&s| g.label(s).is_rmw_write())
                    .map_or(true, |s| is_atomic_rmw(g, s));
                own && next
            }
        }
    }

    /// Happens-before view of `e`
    pub fn hb_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        g.label(e).view(HB_VIEW)
    }
}

/// An RMW write is atomic iff its immediate coherence predecessor is the
/// write its paired read observed.
fn is_atomic_rmw(g: &ExecutionGraph, w: Event) -> bool {
    let source = w.prev().and_then(|r| g.rf_pred(r));
    source.is_some() && g.co_imm_pred(w) == source
}

/// Every non-initializer event, each after its po, rf, tc and tj
/// predecessors. Events on a porf cycle are emitted in stamp order.
pub fn porf_order(g: &ExecutionGraph) -> Vec<Event> {
    let n = g.max_stamp().as_usize() + 1;
    let mut state = vec![0u8; n];
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<(Event, bool)> = Vec::new();

    for lab in g.labels() {
        stack.push((lab.pos(), false));
        while let Some((e, expanded)) = stack.pop() {
            let s = g.label(e).stamp().as_usize();
            if expanded {
                if state[s] == 1 {
                    state[s] = 2;
                    if !e.is_init() {
                        order.push(e);
                    }
                }
                continue;
            }
            if state[s] != 0 {
                continue;
            }
            state[s] = 1;
            stack.push((e, true));
            let preds = [g.po_imm_pred(e), g.rf_pred(e), g.tc_pred(e), g.tj_pred(e)];
            for p in preds.into_iter().flatten() {
                if state[g.label(p).stamp().as_usize()] == 0 {
                    stack.push((p, false));
                }
            }
        }
    }
    order
}
