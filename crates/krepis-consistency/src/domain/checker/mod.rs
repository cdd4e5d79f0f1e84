//! Consistency checkers
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ ConsistencyChecker (trait, object safe)                  │
//! │   ├─ ScChecker    ├─ TsoChecker    ├─ RaChecker          │
//! │   ├─ Rc11Checker  └─ ImmChecker                          │
//! ├──────────────────────────────────────────────────────────┤
//! │ CheckerCore: compiled views + prefix + axioms            │
//! │ coherence:   stores / placings / revisits                │
//! │ safety:      memory errors / races                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each model only states its relation table; everything else is provided
//! by the trait's default methods over [`CheckerCore`]. A checker holds no
//! per-graph state and can be shared between exploration workers.
//!
//! # Driver protocol
//!
//! For every added label `e`:
//!
//! 1. [`ConsistencyChecker::update_mm_views`]
//! 2. [`ConsistencyChecker::is_consistent`]; `false` prunes the execution
//! 3. [`ConsistencyChecker::check_errors`] and
//!    [`ConsistencyChecker::check_warnings`]

pub mod coherence;
pub mod config;
pub mod core;
pub mod derived;
pub mod error;
pub mod imm;
pub mod ra;
pub mod rc11;
pub mod safety;
pub mod sc;
pub mod tso;

pub use self::core::{porf_order, Axiom, AxiomKind, CheckerCore};
pub use config::{CheckerConfig, CheckerConfigBuilder, ModelType};
pub use error::{ConfigError, ErrorKind, VerificationError};
pub use imm::ImmChecker;
pub use ra::RaChecker;
pub use rc11::Rc11Checker;
pub use sc::ScChecker;
pub use tso::TsoChecker;

use crate::domain::graph::{Event, ExecutionGraph};
use crate::domain::view::{PrefixView, View};
use std::collections::HashSet;
use std::fmt;

/// Abort on an operation the model does not provide
#[cold]
fn unsupported(model: ModelType, op: &str) -> ! {
    panic!("{op} is not supported under {model}")
}

/// Memory-model consistency checking
///
/// Implementors provide [`core`](Self::core); every other method has a
/// default in terms of it. Methods taking `&mut ExecutionGraph` only touch
/// the views of labels.
pub trait ConsistencyChecker: Send + Sync + fmt::Debug {
    /// Compiled model table
    fn core(&self) -> &CheckerCore;

    /// Memory model
    fn model(&self) -> ModelType {
        self.core().model()
    }

    /// Whether prefixes are hole-aware
    fn is_dep_tracking(&self) -> bool {
        self.core().is_dep_tracking()
    }

    /// Whether adding `e` kept the graph consistent, assuming it was
    /// consistent before
    ///
    /// Requires `update_mm_views` to have run on `e`.
    fn is_consistent(&self, g: &ExecutionGraph, e: Event) -> bool {
        self.core().is_consistent(g, e)
    }

    /// Full check of every axiom
    fn is_graph_consistent(&self, g: &ExecutionGraph) -> bool {
        self.core().is_graph_consistent(g)
    }

    /// Name of the first violated axiom
    fn first_violation(&self, g: &ExecutionGraph) -> Option<&'static str> {
        self.core().first_violation(g)
    }

    /// Coherence under happens-before with library-method synchronisation
    ///
    /// # Panics
    ///
    /// On models without library refinement support, or when it was not
    /// enabled in the configuration.
    fn is_coherent_relinche(&self, _g: &ExecutionGraph) -> bool {
        unsupported(self.model(), "is_coherent_relinche")
    }

    /// Memory-safety errors and data races at `e`
    fn check_errors(&self, g: &ExecutionGraph, e: Event) -> Result<(), VerificationError> {
        safety::check_errors(g, e)
    }

    /// Warnings at `e` whose kind has not been reported yet
    fn check_warnings(
        &self,
        g: &ExecutionGraph,
        e: Event,
        seen: &HashSet<ErrorKind>,
    ) -> Vec<VerificationError> {
        safety::check_warnings(self.core().config(), g, e, seen)
    }

    /// Compute and attach the views of `e`
    fn update_mm_views(&self, g: &mut ExecutionGraph, e: Event) {
        self.core().update_mm_views(g, e);
    }

    /// Recompute the views of every label
    fn update_all_views(&self, g: &mut ExecutionGraph) {
        self.core().update_all_views(g);
    }

    /// Causal prefix of `e`, dense or hole-aware as the model requires
    fn calculate_prefix_view(&self, g: &ExecutionGraph, e: Event) -> PrefixView {
        self.core().calculate_prefix_view(g, e)
    }

    /// Happens-before view of `e`
    fn hb_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        self.core().hb_view(g, e)
    }

    /// Happens-before view of `e` with library-method synchronisation
    ///
    /// # Panics
    ///
    /// As [`is_coherent_relinche`](Self::is_coherent_relinche).
    fn hb_relinche_view<'g>(&self, _g: &'g ExecutionGraph, _e: Event) -> &'g View {
        unsupported(self.model(), "hb_relinche_view")
    }

    /// Writes the read `read` may observe
    fn coherent_stores(&self, g: &ExecutionGraph, read: Event) -> Vec<Event> {
        coherence::coherent_stores(self.core(), g, read)
    }

    /// Writes the write `write` may be placed immediately after
    fn coherent_placings(&self, g: &ExecutionGraph, write: Event) -> Vec<Event> {
        coherence::coherent_placings(self.core(), g, write)
    }

    /// Keep the reads of `reads` that may coherently observe `w`
    fn filter_coherent_revisits(
        &self,
        g: &ExecutionGraph,
        w: Event,
        reads: Vec<Event>,
    ) -> Vec<Event> {
        coherence::filter_coherent_revisits(self.core(), g, w, reads)
    }

    /// Reads `w` may revisit, given its causal prefix `pporf`
    fn coherent_revisits(&self, g: &ExecutionGraph, w: Event, pporf: &PrefixView) -> Vec<Event> {
        coherence::coherent_revisits(self.core(), g, w, pporf)
    }
}

impl<C: ConsistencyChecker + ?Sized> ConsistencyChecker for Box<C> {
    fn core(&self) -> &CheckerCore {
        (**self).core()
    }

    fn model(&self) -> ModelType {
        (**self).model()
    }

    fn is_dep_tracking(&self) -> bool {
        (**self).is_dep_tracking()
    }

    fn is_consistent(&self, g: &ExecutionGraph, e: Event) -> bool {
        (**self).is_consistent(g, e)
    }

    fn is_graph_consistent(&self, g: &ExecutionGraph) -> bool {
        (**self).is_graph_consistent(g)
    }

    fn first_violation(&self, g: &ExecutionGraph) -> Option<&'static str> {
        (**self).first_violation(g)
    }

    fn is_coherent_relinche(&self, g: &ExecutionGraph) -> bool {
        (**self).is_coherent_relinche(g)
    }

    fn check_errors(&self, g: &ExecutionGraph, e: Event) -> Result<(), VerificationError> {
        (**self).check_errors(g, e)
    }

    fn check_warnings(
        &self,
        g: &ExecutionGraph,
        e: Event,
        seen: &HashSet<ErrorKind>,
    ) -> Vec<VerificationError> {
        (**self).check_warnings(g, e, seen)
    }

    fn update_mm_views(&self, g: &mut ExecutionGraph, e: Event) {
        (**self).update_mm_views(g, e);
    }

    fn update_all_views(&self, g: &mut ExecutionGraph) {
        (**self).update_all_views(g);
    }

    fn calculate_prefix_view(&self, g: &ExecutionGraph, e: Event) -> PrefixView {
        (**self).calculate_prefix_view(g, e)
    }

    fn hb_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        (**self).hb_view(g, e)
    }

    fn hb_relinche_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        (**self).hb_relinche_view(g, e)
    }

    fn coherent_stores(&self, g: &ExecutionGraph, read: Event) -> Vec<Event> {
        (**self).coherent_stores(g, read)
    }

    fn coherent_placings(&self, g: &ExecutionGraph, write: Event) -> Vec<Event> {
        (**self).coherent_placings(g, write)
    }

    fn filter_coherent_revisits(
        &self,
        g: &ExecutionGraph,
        w: Event,
        reads: Vec<Event>,
    ) -> Vec<Event> {
        (**self).filter_coherent_revisits(g, w, reads)
    }

    fn coherent_revisits(&self, g: &ExecutionGraph, w: Event, pporf: &PrefixView) -> Vec<Event> {
        (**self).coherent_revisits(g, w, pporf)
    }
}

/// Checker for `config.model`
///
/// Options the model cannot honour are ignored; use [`try_create`] to
/// reject them instead.
pub fn create(config: &CheckerConfig) -> Box<dyn ConsistencyChecker> {
    match config.model {
        ModelType::Sc => Box::new(ScChecker::new(config)),
        ModelType::Tso => Box::new(TsoChecker::new(config)),
        ModelType::Ra => Box::new(RaChecker::new(config)),
        ModelType::Rc11 => Box::new(Rc11Checker::new(config)),
        ModelType::Imm => Box::new(ImmChecker::new(config)),
    }
}

/// Validate `config` and create its checker
pub fn try_create(config: &CheckerConfig) -> Result<Box<dyn ConsistencyChecker>, ConfigError> {
    config.validate()?;
    Ok(create(config))
}
