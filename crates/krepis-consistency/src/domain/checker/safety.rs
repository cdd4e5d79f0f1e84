//! Memory-safety and race detection
//!
//! Errors are judged against happens-before, so they must run after
//! `update_mm_views` on the new label. Accesses without views yet (added but
//! not processed) are skipped as race partners.

use super::config::CheckerConfig;
use super::derived::HB_VIEW;
use super::error::{ErrorKind, VerificationError};
use crate::domain::graph::{Event, EventLabel, ExecutionGraph, LabelKind};
use crate::domain::view::{VectorClock, View};
use std::collections::HashSet;

fn hb(g: &ExecutionGraph, e: Event) -> &View {
    g.label(e).view(HB_VIEW)
}

fn is_hb_ordered(g: &ExecutionGraph, a: Event, b: Event) -> bool {
    hb(g, a).contains(b) || hb(g, b).contains(a)
}

/// Hard errors at `e`
pub fn check_errors(g: &ExecutionGraph, e: Event) -> Result<(), VerificationError> {
    let lab = g.label(e);
    match lab.kind() {
        LabelKind::Read(_) | LabelKind::Write(_) => {
            if lab.access_addr().is_some_and(|a| a.is_heap()) {
                check_heap_access(g, e)?;
            }
            check_data_race(g, lab)
        }
        LabelKind::Free { .. } => check_free(g, e),
        _ => Ok(()),
    }
}

fn check_heap_access(g: &ExecutionGraph, e: Event) -> Result<(), VerificationError> {
    if !g.alloc_pred(e).is_some_and(|m| hb(g, e).contains(m)) {
        return Err(VerificationError::AccessNonMalloc { event: e });
    }
    match g.free_pred(e) {
        Some(free) if !hb(g, free).contains(e) => {
            Err(VerificationError::AccessFreed { event: e, other: free })
        }
        _ => Ok(()),
    }
}

fn check_free(g: &ExecutionGraph, free: Event) -> Result<(), VerificationError> {
    let Some(alloc) = g.alloc_pred(free).filter(|&m| hb(g, free).contains(m)) else {
        return Err(VerificationError::AccessNonMalloc { event: free });
    };
    if let Some(other) = g.frees_of(alloc).into_iter().find(|&f| f != free) {
        return Err(VerificationError::DoubleFree { event: free, other });
    }
    let racing = g.alloc_succs(alloc).into_iter().find(|&x| {
        x != free && g.label(x).is_access() && !hb(g, free).contains(x)
    });
    match racing {
        Some(access) => Err(VerificationError::AccessFreed {
            event: free,
            other: access,
        }),
        None => Ok(()),
    }
}

fn check_data_race(g: &ExecutionGraph, lab: &EventLabel) -> Result<(), VerificationError> {
    let e = lab.pos();
    let racy = g.samelocs(e).into_iter().find(|&x| {
        let other = g.label(x);
        other.has_views()
            && (lab.is_write() || other.is_write())
            && (lab.is_not_atomic() || other.is_not_atomic())
            && !is_hb_ordered(g, e, x)
    });
    match racy {
        Some(other) => Err(VerificationError::RaceNotAtomic { event: e, other }),
        None => Ok(()),
    }
}

/// Soft findings at `e` whose kind is not already in `seen`
pub fn check_warnings(
    config: &CheckerConfig,
    g: &ExecutionGraph,
    e: Event,
    seen: &HashSet<ErrorKind>,
) -> Vec<VerificationError> {
    let lab = g.label(e);
    if !config.check_ww_races || !lab.is_write() || seen.contains(&ErrorKind::WwRace) {
        return Vec::new();
    }
    g.samelocs(e)
        .into_iter()
        .find(|&x| {
            let other = g.label(x);
            other.is_write() && other.has_views() && !is_hb_ordered(g, e, x)
        })
        .map(|other| VerificationError::WwRace { event: e, other })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checker::config::ModelType;
    use crate::domain::checker::core::{Axiom, CheckerCore};
    use crate::domain::checker::derived::porf_step;
    use crate::domain::graph::{Addr, CoPlacement, MemOrdering, ThreadId};

    const NA: MemOrdering = MemOrdering::NotAtomic;
    const RLX: MemOrdering = MemOrdering::Relaxed;

    fn porf_core() -> CheckerCore {
        CheckerCore::new(
            CheckerConfig::new(ModelType::Ra),
            &[porf_step()],
            &porf_step(),
            false,
            vec![Axiom::atomicity()],
        )
    }

    #[test]
    fn test_na_race_between_threads() {
        let core = porf_core();
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let a = g.add_write(ThreadId::MAIN, Addr::global(0), NA, CoPlacement::Max);
        let b = g.add_write(t1, Addr::global(0), RLX, CoPlacement::Max);
        core.update_all_views(&mut g);
        assert_eq!(
            check_errors(&g, b),
            Err(VerificationError::RaceNotAtomic { event: b, other: a })
        );
    }

    #[test]
    fn test_atomic_accesses_do_not_race() {
        let core = porf_core();
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        g.add_write(ThreadId::MAIN, Addr::global(0), RLX, CoPlacement::Max);
        let b = g.add_write(t1, Addr::global(0), RLX, CoPlacement::Max);
        core.update_all_views(&mut g);
        assert_eq!(check_errors(&g, b), Ok(()));

        let seen = HashSet::new();
        let config = CheckerConfig::new(ModelType::Ra);
        let warnings = check_warnings(&config, &g, b, &seen);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), ErrorKind::WwRace);

        let seen: HashSet<_> = [ErrorKind::WwRace].into_iter().collect();
        assert!(check_warnings(&config, &g, b, &seen).is_empty());
    }

    #[test]
    fn test_heap_lifetime() {
        let core = porf_core();
        let mut g = ExecutionGraph::new();
        let p = Addr::heap(0);
        g.add_malloc(ThreadId::MAIN, p, 8);
        let w = g.add_write(ThreadId::MAIN, p, NA, CoPlacement::Max);
        let f = g.add_free(ThreadId::MAIN, p);
        core.update_all_views(&mut g);
        assert_eq!(check_errors(&g, w), Ok(()));
        assert_eq!(check_errors(&g, f), Ok(()));

        let late = g.add_read(ThreadId::MAIN, p, NA, w);
        core.update_mm_views(&mut g, late);
        assert_eq!(
            check_errors(&g, late),
            Err(VerificationError::AccessFreed { event: late, other: f })
        );

        let again = g.add_free(ThreadId::MAIN, p);
        core.update_mm_views(&mut g, again);
        assert_eq!(
            check_errors(&g, again),
            Err(VerificationError::DoubleFree { event: again, other: f })
        );
    }

    #[test]
    fn test_access_without_malloc() {
        let core = porf_core();
        let mut g = ExecutionGraph::new();
        let w = g.add_write(ThreadId::MAIN, Addr::heap(64), NA, CoPlacement::Max);
        core.update_all_views(&mut g);
        assert_eq!(
            check_errors(&g, w),
            Err(VerificationError::AccessNonMalloc { event: w })
        );
    }
}
