//! Traversal scratch state
//!
//! Every traversal runs over the product of graph events and automaton
//! states. Node `(e, s)` has the dense id `stamp(e) * states + s`, so
//! scratch arrays are plain vectors indexed by id.
//!
//! Marks are epoch-tagged: starting a traversal bumps the epoch instead of
//! clearing the arrays, and a node whose tag is stale reads as unseen.

use crate::domain::graph::{Event, ExecutionGraph, Stamp};
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// DFS colour of a product node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    /// Not reached in the current traversal
    #[default]
    Unseen,
    /// Reached and still on the traversal stack
    Entered,
    /// Fully explored
    Left,
}

/// Pending expansion of one product node
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub node: usize,
    pub start: usize,
    pub cursor: usize,
    pub end: usize,
}

/// Scratch arrays for one traversal at a time
#[derive(Debug, Default)]
pub struct TraversalContext {
    epoch: u32,
    tags: Vec<u32>,
    status: Vec<NodeStatus>,
    index: Vec<u32>,
    lowlink: Vec<u32>,
    states: usize,
    pub(crate) counter: u32,
    pub(crate) stack: Vec<usize>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) succs: Vec<(usize, bool)>,
}

impl TraversalContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for a traversal of `g` with an automaton of `states` states
    pub fn reset(&mut self, g: &ExecutionGraph, states: usize) {
        let nodes = (g.max_stamp().as_usize() + 1) * states;
        if self.tags.len() < nodes {
            self.tags.resize(nodes, 0);
            self.status.resize(nodes, NodeStatus::Unseen);
            self.index.resize(nodes, 0);
            self.lowlink.resize(nodes, 0);
        }
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.tags.iter_mut().for_each(|t| *t = 0);
            self.epoch = 1;
        }
        self.states = states;
        self.counter = 0;
        self.stack.clear();
        self.frames.clear();
        self.succs.clear();
    }

    /// Id of node `(e, state)`
    #[inline]
    pub fn node(&self, g: &ExecutionGraph, e: Event, state: usize) -> usize {
        g.label(e).stamp().as_usize() * self.states + state
    }

    /// Event and state of a node id
    #[inline]
    pub fn decode(&self, g: &ExecutionGraph, node: usize) -> (Event, usize) {
        let stamp = Stamp((node / self.states) as u32);
        (g.event_at(stamp), node % self.states)
    }

    /// Colour of `node` in the current traversal
    #[inline]
    pub fn status(&self, node: usize) -> NodeStatus {
        if self.tags[node] == self.epoch {
            self.status[node]
        } else {
            NodeStatus::Unseen
        }
    }

    /// Recolour `node`
    #[inline]
    pub fn set_status(&mut self, node: usize, status: NodeStatus) {
        self.tags[node] = self.epoch;
        self.status[node] = status;
    }

    #[inline]
    pub(crate) fn index(&self, node: usize) -> u32 {
        self.index[node]
    }

    #[inline]
    pub(crate) fn lowlink(&self, node: usize) -> u32 {
        self.lowlink[node]
    }

    #[inline]
    pub(crate) fn set_lowlink(&mut self, node: usize, value: u32) {
        self.lowlink[node] = value;
    }

    /// Give `node` the next DFS index
    pub(crate) fn number(&mut self, node: usize) {
        self.index[node] = self.counter;
        self.lowlink[node] = self.counter;
        self.counter += 1;
    }
}

/// Pool of traversal contexts shared by every caller of one checker
#[derive(Debug, Default)]
pub struct ScratchPool {
    free: Mutex<Vec<TraversalContext>>,
}

impl ScratchPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a context; it returns to the pool when the guard drops
    pub fn acquire(&self) -> ScratchGuard<'_> {
        let ctx = self.free.lock().pop().unwrap_or_default();
        ScratchGuard { pool: self, ctx }
    }

    /// Number of idle contexts
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

/// Exclusive access to a pooled context
pub struct ScratchGuard<'a> {
    pool: &'a ScratchPool,
    ctx: TraversalContext,
}

impl Deref for ScratchGuard<'_> {
    type Target = TraversalContext;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl DerefMut for ScratchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ctx
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        let ctx = std::mem::take(&mut self.ctx);
        self.pool.free.lock().push(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{MemOrdering, ThreadId};

    #[test]
    fn test_epoch_reset() {
        let mut g = ExecutionGraph::new();
        g.add_fence(ThreadId::MAIN, MemOrdering::SeqCst);
        let mut ctx = TraversalContext::new();
        ctx.reset(&g, 3);
        let node = ctx.node(&g, Event::new(ThreadId::MAIN, 1), 2);
        assert_eq!(node, 5);
        assert_eq!(ctx.decode(&g, node), (Event::new(ThreadId::MAIN, 1), 2));
        ctx.set_status(node, NodeStatus::Left);
        assert_eq!(ctx.status(node), NodeStatus::Left);
        ctx.reset(&g, 3);
        assert_eq!(ctx.status(node), NodeStatus::Unseen);
    }

    #[test]
    fn test_pool_recycles() {
        let pool = ScratchPool::new();
        assert_eq!(pool.idle(), 0);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
        }
        assert_eq!(pool.idle(), 2);
        let _c = pool.acquire();
        assert_eq!(pool.idle(), 1);
    }
}
