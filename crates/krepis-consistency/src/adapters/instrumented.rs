//! Instrumented checker
//!
//! Counts every checker call and reports program-level errors through
//! `tracing`. Wrap any checker, including a boxed one from
//! [`create`](crate::create):
//!
//! ```rust
//! use krepis_consistency::{create, CheckerConfig, ConsistencyChecker, InstrumentedChecker};
//!
//! let checker = InstrumentedChecker::new(create(&CheckerConfig::default()));
//! assert_eq!(checker.stats().consistency_checks, 0);
//! ```

use crate::domain::checker::{
    CheckerCore, ConsistencyChecker, ErrorKind, ModelType, VerificationError,
};
use crate::domain::graph::{Event, ExecutionGraph};
use crate::domain::view::{PrefixView, View};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Call counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckerStats {
    /// `update_mm_views` calls
    pub view_updates: u64,
    /// Incremental consistency checks
    pub consistency_checks: u64,
    /// Incremental checks that failed
    pub inconsistent: u64,
    /// Full-graph consistency checks
    pub graph_checks: u64,
    /// Hard errors reported
    pub errors: u64,
    /// Warnings reported
    pub warnings: u64,
    /// `coherent_stores` calls
    pub store_queries: u64,
    /// `coherent_placings` calls
    pub placing_queries: u64,
    /// `coherent_revisits` and `filter_coherent_revisits` calls
    pub revisit_queries: u64,
}

impl CheckerStats {
    /// Share of incremental checks that pruned the execution
    pub fn pruning_rate(&self) -> f64 {
        if self.consistency_checks == 0 {
            0.0
        } else {
            self.inconsistent as f64 / self.consistency_checks as f64
        }
    }
}

/// Checker decorator recording [`CheckerStats`]
#[derive(Debug)]
pub struct InstrumentedChecker<C> {
    inner: C,
    stats: Mutex<CheckerStats>,
}

impl<C: ConsistencyChecker> InstrumentedChecker<C> {
    /// Wrap `inner`
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            stats: Mutex::new(CheckerStats::default()),
        }
    }

    /// Copy of the counters
    pub fn stats(&self) -> CheckerStats {
        self.stats.lock().clone()
    }

    /// Zero the counters
    pub fn reset_stats(&self) {
        *self.stats.lock() = CheckerStats::default();
    }

    /// The wrapped checker
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn record(&self, f: impl FnOnce(&mut CheckerStats)) {
        f(&mut self.stats.lock());
    }
}

impl<C: ConsistencyChecker> ConsistencyChecker for InstrumentedChecker<C> {
    fn core(&self) -> &CheckerCore {
        self.inner.core()
    }

    fn model(&self) -> ModelType {
        self.inner.model()
    }

    fn is_consistent(&self, g: &ExecutionGraph, e: Event) -> bool {
        let ok = self.inner.is_consistent(g, e);
        self.record(|s| {
            s.consistency_checks += 1;
            if !ok {
                s.inconsistent += 1;
            }
        });
        trace!(model = %self.model(), event = %e, consistent = ok, "incremental check");
        ok
    }

    fn is_graph_consistent(&self, g: &ExecutionGraph) -> bool {
        self.record(|s| s.graph_checks += 1);
        self.inner.is_graph_consistent(g)
    }

    fn first_violation(&self, g: &ExecutionGraph) -> Option<&'static str> {
        self.record(|s| s.graph_checks += 1);
        self.inner.first_violation(g)
    }

    fn is_coherent_relinche(&self, g: &ExecutionGraph) -> bool {
        self.inner.is_coherent_relinche(g)
    }

    fn check_errors(&self, g: &ExecutionGraph, e: Event) -> Result<(), VerificationError> {
        let result = self.inner.check_errors(g, e);
        if let Err(err) = &result {
            self.record(|s| s.errors += 1);
            warn!(
                model = %self.model(),
                kind = %err.kind(),
                code = err.kind().code(),
                event = %err.event(),
                "{err}"
            );
        }
        result
    }

    fn check_warnings(
        &self,
        g: &ExecutionGraph,
        e: Event,
        seen: &HashSet<ErrorKind>,
    ) -> Vec<VerificationError> {
        let warnings = self.inner.check_warnings(g, e, seen);
        if !warnings.is_empty() {
            self.record(|s| s.warnings += warnings.len() as u64);
            for w in &warnings {
                debug!(model = %self.model(), kind = %w.kind(), event = %w.event(), "{w}");
            }
        }
        warnings
    }

    fn update_mm_views(&self, g: &mut ExecutionGraph, e: Event) {
        self.record(|s| s.view_updates += 1);
        self.inner.update_mm_views(g, e);
    }

    fn update_all_views(&self, g: &mut ExecutionGraph) {
        self.record(|s| s.view_updates += g.len() as u64);
        self.inner.update_all_views(g);
    }

    fn calculate_prefix_view(&self, g: &ExecutionGraph, e: Event) -> PrefixView {
        self.inner.calculate_prefix_view(g, e)
    }

    fn hb_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        self.inner.hb_view(g, e)
    }

    fn hb_relinche_view<'g>(&self, g: &'g ExecutionGraph, e: Event) -> &'g View {
        self.inner.hb_relinche_view(g, e)
    }

    fn coherent_stores(&self, g: &ExecutionGraph, read: Event) -> Vec<Event> {
        self.record(|s| s.store_queries += 1);
        let stores = self.inner.coherent_stores(g, read);
        trace!(read = %read, candidates = stores.len(), "coherent stores");
        stores
    }

    fn coherent_placings(&self, g: &ExecutionGraph, write: Event) -> Vec<Event> {
        self.record(|s| s.placing_queries += 1);
        self.inner.coherent_placings(g, write)
    }

    fn filter_coherent_revisits(
        &self,
        g: &ExecutionGraph,
        w: Event,
        reads: Vec<Event>,
    ) -> Vec<Event> {
        self.record(|s| s.revisit_queries += 1);
        self.inner.filter_coherent_revisits(g, w, reads)
    }

    fn coherent_revisits(&self, g: &ExecutionGraph, w: Event, pporf: &PrefixView) -> Vec<Event> {
        self.record(|s| s.revisit_queries += 1);
        self.inner.coherent_revisits(g, w, pporf)
    }
}
