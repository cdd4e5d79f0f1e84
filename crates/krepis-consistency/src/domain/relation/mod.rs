//! Relation algebra
//!
//! Derived relations of a memory model are expressions over primitive
//! graph edges ([`Step`]) and label tests ([`Guard`]), combined with
//! sequence, union and closures. Each expression compiles once into an
//! [`Automaton`] that the traversal engine runs over the graph.
//!
//! ```text
//! Rel (forward)  ──compile──▶  Automaton (backward)  ──engine──▶  views / cycles
//! ```

pub mod algebra;
pub mod automaton;
pub mod guard;
pub mod step;

pub use algebra::{alt, seq, step, test, Rel};
pub use automaton::{Automaton, Move};
pub use guard::Guard;
pub use step::{Preds, Step};
