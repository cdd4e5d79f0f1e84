//! View accumulation
//!
//! The view of `e` for a one-step relation `R` is `{e}` joined with the
//! stored views of every `R`-predecessor of `e`. Predecessors are found by
//! running the relation's automaton backwards from `(e, start)`; each
//! product node is expanded at most once.

use super::context::{NodeStatus, TraversalContext};
use crate::domain::graph::{Event, EventLabel, ExecutionGraph};
use crate::domain::relation::{Automaton, Move, Preds};
use crate::domain::view::VectorClock;

/// Join into `acc` the stored views of all `automaton`-predecessors of `pos`
///
/// `fetch` reads the stored view of a predecessor. The initializer, and any
/// label not processed yet (a porf cycle under a model that allows one),
/// contributes only itself.
pub fn calc_view<'g, C, F>(
    g: &'g ExecutionGraph,
    automaton: &Automaton,
    ctx: &mut TraversalContext,
    pos: Event,
    mut acc: C,
    fetch: F,
) -> C
where
    C: VectorClock + 'g,
    F: Fn(&'g EventLabel) -> &'g C,
{
    ctx.reset(g, automaton.num_states());
    acc.update_idx(pos);

    let root = ctx.node(g, pos, automaton.start());
    ctx.set_status(root, NodeStatus::Entered);
    ctx.stack.push(root);

    let mut preds = Preds::new();
    while let Some(node) = ctx.stack.pop() {
        let (e, state) = ctx.decode(g, node);
        if state == automaton.accept() {
            if e == pos {
                continue;
            }
            let lab = g.label(e);
            if e.is_init() || !lab.has_views() {
                acc.update_idx(e);
            } else {
                acc.update(fetch(lab));
            }
            continue;
        }

        for (mv, next) in automaton.edges(state) {
            match mv {
                Move::Eps => push(g, ctx, e, *next),
                Move::Test(guard) => {
                    if guard.holds(g, g.label(e)) {
                        push(g, ctx, e, *next);
                    }
                }
                Move::Step(step) => {
                    preds.clear();
                    step.collect_preds(g, e, &mut preds);
                    for &p in &preds {
                        push(g, ctx, p, *next);
                    }
                }
            }
        }
    }
    acc
}

#[inline]
fn push(g: &ExecutionGraph, ctx: &mut TraversalContext, e: Event, state: usize) {
    let node = ctx.node(g, e, state);
    if ctx.status(node) == NodeStatus::Unseen {
        ctx.set_status(node, NodeStatus::Entered);
        ctx.stack.push(node);
    }
}
