//! Compiled relation automata
//!
//! States are dense indices. Walking from `start` at event `e` to `accept`
//! at event `p` witnesses that `p` is related to `e`. The accept state never
//! has outgoing moves.

use super::guard::Guard;
use super::step::Step;

/// Transition label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    /// Stay on the current event
    Eps,
    /// Stay on the current event if the guard holds
    Test(Guard),
    /// Move to a predecessor along a primitive step
    Step(Step),
}

/// Nondeterministic automaton over predecessor steps
#[derive(Debug, Clone)]
pub struct Automaton {
    edges: Vec<Vec<(Move, usize)>>,
    start: usize,
    accept: usize,
    steps: Vec<Step>,
}

impl Automaton {
    pub(crate) fn new(edges: Vec<Vec<(Move, usize)>>, start: usize, accept: usize) -> Self {
        debug_assert!(edges[accept].is_empty());
        let mut steps = Vec::new();
        for (mv, _) in edges.iter().flatten() {
            if let Move::Step(s) = mv {
                if !steps.contains(s) {
                    steps.push(*s);
                }
            }
        }
        Self {
            edges,
            start,
            accept,
            steps,
        }
    }

    /// Number of states
    #[inline]
    pub fn num_states(&self) -> usize {
        self.edges.len()
    }

    /// Initial state
    #[inline]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Accepting state
    #[inline]
    pub const fn accept(&self) -> usize {
        self.accept
    }

    /// Outgoing moves of `state`
    #[inline]
    pub fn edges(&self, state: usize) -> &[(Move, usize)] {
        &self.edges[state]
    }

    /// Distinct primitive steps used anywhere in the automaton
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
