//! Relation expressions
//!
//! Relations are written in forward notation, the way memory-model papers
//! write them: `seq([test(W), rf, test(R)])` relates a write to the reads
//! observing it. [`Rel::compile`] turns an expression into an [`Automaton`]
//! that walks the graph backwards, from the target of an edge to its source.

use super::automaton::{Automaton, Move};
use super::guard::Guard;
use super::step::Step;

/// Relation expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rel {
    /// A primitive edge
    Step(Step),
    /// Identity restricted to labels satisfying a guard
    Test(Guard),
    /// Composition, left to right
    Seq(Vec<Rel>),
    /// Union
    Alt(Vec<Rel>),
    /// Reflexive closure
    Opt(Box<Rel>),
    /// Transitive closure
    Plus(Box<Rel>),
    /// Reflexive-transitive closure
    Star(Box<Rel>),
}

/// Primitive edge
pub const fn step(s: Step) -> Rel {
    Rel::Step(s)
}

/// Guard test
pub const fn test(g: Guard) -> Rel {
    Rel::Test(g)
}

/// Composition
pub fn seq(rels: impl IntoIterator<Item = Rel>) -> Rel {
    Rel::Seq(rels.into_iter().collect())
}

/// Union
pub fn alt(rels: impl IntoIterator<Item = Rel>) -> Rel {
    Rel::Alt(rels.into_iter().collect())
}

impl Rel {
    /// `self?`
    #[must_use]
    pub fn opt(self) -> Self {
        Self::Opt(Box::new(self))
    }

    /// `self+`
    #[must_use]
    pub fn plus(self) -> Self {
        Self::Plus(Box::new(self))
    }

    /// `self*`
    #[must_use]
    pub fn star(self) -> Self {
        Self::Star(Box::new(self))
    }

    /// Whether some path through the expression consumes no edge
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Step(_) => false,
            Self::Test(_) | Self::Opt(_) | Self::Star(_) => true,
            Self::Seq(rels) => rels.iter().all(Self::is_nullable),
            Self::Alt(rels) => rels.iter().any(Self::is_nullable),
            Self::Plus(inner) => inner.is_nullable(),
        }
    }

    /// Compile to a predecessor-walking automaton
    pub fn compile(&self) -> Automaton {
        let mut builder = Builder::default();
        let start = builder.state();
        let accept = builder.state();
        builder.build(self, start, accept);
        Automaton::new(builder.edges, start, accept)
    }
}

#[derive(Default)]
struct Builder {
    edges: Vec<Vec<(Move, usize)>>,
}

impl Builder {
    fn state(&mut self) -> usize {
        self.edges.push(Vec::new());
        self.edges.len() - 1
    }

    fn edge(&mut self, from: usize, mv: Move, to: usize) {
        self.edges[from].push((mv, to));
    }

    // Thompson construction. `from` is the state reached at the edge's
    // target, `to` the one at its source, so sequences run back to front.
    // Loops always get fresh states so they never leak into `from`/`to`.
    fn build(&mut self, rel: &Rel, from: usize, to: usize) {
        match rel {
            Rel::Step(s) => self.edge(from, Move::Step(*s), to),
            Rel::Test(g) => self.edge(from, Move::Test(g.clone()), to),
            Rel::Seq(rels) => {
                let mut cur = from;
                let mut rest = rels.iter().rev().peekable();
                while let Some(r) = rest.next() {
                    let next = if rest.peek().is_some() { self.state() } else { to };
                    self.build(r, cur, next);
                    cur = next;
                }
                if rels.is_empty() {
                    self.edge(from, Move::Eps, to);
                }
            }
            Rel::Alt(rels) => {
                for r in rels {
                    let inner_from = self.state();
                    self.edge(from, Move::Eps, inner_from);
                    self.build(r, inner_from, to);
                }
            }
            Rel::Opt(inner) => {
                self.edge(from, Move::Eps, to);
                self.build(inner, from, to);
            }
            Rel::Plus(inner) => {
                let head = self.state();
                let tail = self.state();
                self.edge(from, Move::Eps, head);
                self.build(inner, head, tail);
                self.edge(tail, Move::Eps, head);
                self.edge(tail, Move::Eps, to);
            }
            Rel::Star(inner) => {
                let head = self.state();
                self.edge(from, Move::Eps, head);
                let tail = self.state();
                self.build(inner, head, tail);
                self.edge(tail, Move::Eps, head);
                self.edge(head, Move::Eps, to);
            }
        }
    }
}
