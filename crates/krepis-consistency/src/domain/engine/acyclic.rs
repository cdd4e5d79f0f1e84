//! Acyclicity of derived relations
//!
//! `R` is acyclic iff the product of the graph with `R`'s automaton has no
//! cycle through an accepting edge `(e, accept) → (e, start)`. Reaching
//! `(p, accept)` from `(e, start)` witnesses `p R e`, so chaining accepting
//! edges chains `R` edges.
//!
//! The search is Tarjan's SCC algorithm with an explicit stack:
//!
//! - an accepting edge into a node still on the Tarjan stack closes a cycle
//!   right away;
//! - otherwise, when a component is popped, any accepting edge with both
//!   ends in that component closes a cycle.
//!
//! The relation must not be nullable, so each accepting segment consumes at
//! least one primitive edge.

use super::context::{Frame, NodeStatus, TraversalContext};
use crate::domain::graph::{Event, ExecutionGraph};
use crate::domain::relation::{Automaton, Move, Preds};

/// Whether `automaton`'s relation has a cycle anywhere in `g`
pub fn has_cycle(g: &ExecutionGraph, automaton: &Automaton, ctx: &mut TraversalContext) -> bool {
    ctx.reset(g, automaton.num_states());
    for lab in g.labels() {
        let root = ctx.node(g, lab.pos(), automaton.start());
        if ctx.status(root) == NodeStatus::Unseen && strong_connect(g, automaton, ctx, root) {
            return true;
        }
    }
    false
}

/// Whether `automaton`'s relation has a cycle reachable from `e`
///
/// Every cycle through `e` passes through `(e, s)` for some state `s`, so
/// all of them are roots.
pub fn has_cycle_through(
    g: &ExecutionGraph,
    automaton: &Automaton,
    ctx: &mut TraversalContext,
    e: Event,
) -> bool {
    ctx.reset(g, automaton.num_states());
    for state in 0..automaton.num_states() {
        let root = ctx.node(g, e, state);
        if ctx.status(root) == NodeStatus::Unseen && strong_connect(g, automaton, ctx, root) {
            return true;
        }
    }
    false
}

fn enter(g: &ExecutionGraph, automaton: &Automaton, ctx: &mut TraversalContext, node: usize) {
    ctx.number(node);
    ctx.set_status(node, NodeStatus::Entered);
    ctx.stack.push(node);

    let start = ctx.succs.len();
    let (e, state) = ctx.decode(g, node);
    if state == automaton.accept() {
        let back = ctx.node(g, e, automaton.start());
        ctx.succs.push((back, true));
    } else {
        let mut preds = Preds::new();
        for (mv, next) in automaton.edges(state) {
            match mv {
                Move::Eps => {
                    let succ = ctx.node(g, e, *next);
                    ctx.succs.push((succ, false));
                }
                Move::Test(guard) => {
                    if guard.holds(g, g.label(e)) {
                        let succ = ctx.node(g, e, *next);
                        ctx.succs.push((succ, false));
                    }
                }
                Move::Step(step) => {
                    preds.clear();
                    step.collect_preds(g, e, &mut preds);
                    for &p in &preds {
                        let succ = ctx.node(g, p, *next);
                        ctx.succs.push((succ, false));
                    }
                }
            }
        }
    }
    let end = ctx.succs.len();
    ctx.frames.push(Frame {
        node,
        start,
        cursor: start,
        end,
    });
}

fn strong_connect(
    g: &ExecutionGraph,
    automaton: &Automaton,
    ctx: &mut TraversalContext,
    root: usize,
) -> bool {
    enter(g, automaton, ctx, root);

    while let Some(frame) = ctx.frames.last().copied() {
        if frame.cursor < frame.end {
            if let Some(top) = ctx.frames.last_mut() {
                top.cursor += 1;
            }
            let (succ, accepting) = ctx.succs[frame.cursor];
            match ctx.status(succ) {
                NodeStatus::Unseen => enter(g, automaton, ctx, succ),
                NodeStatus::Entered => {
                    if accepting {
                        return true;
                    }
                    let low = ctx.lowlink(frame.node).min(ctx.index(succ));
                    ctx.set_lowlink(frame.node, low);
                }
                NodeStatus::Left => {}
            }
            continue;
        }

        ctx.frames.pop();
        ctx.succs.truncate(frame.start);
        let node = frame.node;

        if ctx.lowlink(node) == ctx.index(node) {
            if closes_accepting_cycle(g, automaton, ctx, node) {
                return true;
            }
            while let Some(member) = ctx.stack.pop() {
                ctx.set_status(member, NodeStatus::Left);
                if member == node {
                    break;
                }
            }
        }

        if let Some(parent) = ctx.frames.last() {
            let parent = parent.node;
            let low = ctx.lowlink(parent).min(ctx.lowlink(node));
            ctx.set_lowlink(parent, low);
        }
    }
    false
}

// Members of the component rooted at `root` are the stack entries from
// `root` upwards; they are exactly the entered nodes numbered after it.
fn closes_accepting_cycle(
    g: &ExecutionGraph,
    automaton: &Automaton,
    ctx: &TraversalContext,
    root: usize,
) -> bool {
    let floor = ctx.index(root);
    ctx.stack
        .iter()
        .rev()
        .take_while(|&&m| ctx.index(m) >= floor)
        .any(|&m| {
            let (e, state) = ctx.decode(g, m);
            if state != automaton.accept() {
                return false;
            }
            let back = ctx.node(g, e, automaton.start());
            ctx.status(back) == NodeStatus::Entered && ctx.index(back) >= floor
        })
}
