//! Memory errors and race reporting through the checker interface

use krepis_consistency::{
    create, Addr, CheckerConfig, CoPlacement, ConsistencyChecker, ErrorKind, Event,
    ExecutionGraph, MemOrdering, ModelType, ThreadId, VerificationError,
};
use std::collections::HashSet;

const NA: MemOrdering = MemOrdering::NotAtomic;
const RLX: MemOrdering = MemOrdering::Relaxed;
const REL: MemOrdering = MemOrdering::Release;
const ACQ: MemOrdering = MemOrdering::Acquire;

#[test]
fn test_ww_race_reported_once() {
    let config = CheckerConfig::builder()
        .model(ModelType::Rc11)
        .check_ww_races(true)
        .build();
    let c = create(&config);
    let mut g = ExecutionGraph::new();
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    let a = g.add_write(ThreadId::MAIN, Addr::global(0), RLX, CoPlacement::Max);
    let b = g.add_write(t1, Addr::global(0), RLX, CoPlacement::Max);
    c.update_all_views(&mut g);

    let mut seen = HashSet::new();
    let warnings = c.check_warnings(&g, b, &seen);
    assert_eq!(warnings, vec![VerificationError::WwRace { event: b, other: a }]);
    seen.extend(warnings.iter().map(VerificationError::kind));

    let d = g.add_write(t1, Addr::global(0), RLX, CoPlacement::Max);
    c.update_mm_views(&mut g, d);
    assert!(c.check_warnings(&g, d, &seen).is_empty());
}

#[test]
fn test_ww_races_can_be_disabled() {
    let config = CheckerConfig::builder().check_ww_races(false).build();
    let c = create(&config);
    let mut g = ExecutionGraph::new();
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    g.add_write(ThreadId::MAIN, Addr::global(0), RLX, CoPlacement::Max);
    let b = g.add_write(t1, Addr::global(0), RLX, CoPlacement::Max);
    c.update_all_views(&mut g);
    assert!(c.check_warnings(&g, b, &HashSet::new()).is_empty());
    assert_eq!(c.check_errors(&g, b), Ok(()));
}

#[test]
fn test_synchronised_na_accesses_are_race_free() {
    for model in [ModelType::Ra, ModelType::Rc11, ModelType::Imm] {
        let c = create(&CheckerConfig::new(model));
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let data = g.add_write(ThreadId::MAIN, Addr::global(0), NA, CoPlacement::Max);
        let flag = g.add_write(ThreadId::MAIN, Addr::global(8), REL, CoPlacement::Max);
        g.add_read(t1, Addr::global(8), ACQ, flag);
        let r = g.add_read(t1, Addr::global(0), NA, data);
        c.update_all_views(&mut g);
        assert_eq!(c.check_errors(&g, r), Ok(()), "{model}");
    }
}

#[test]
fn test_relaxed_flag_leaves_na_race() {
    let c = create(&CheckerConfig::new(ModelType::Rc11));
    let mut g = ExecutionGraph::new();
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    let data = g.add_write(ThreadId::MAIN, Addr::global(0), NA, CoPlacement::Max);
    let flag = g.add_write(ThreadId::MAIN, Addr::global(8), RLX, CoPlacement::Max);
    g.add_read(t1, Addr::global(8), RLX, flag);
    let r = g.add_read(t1, Addr::global(0), NA, data);
    c.update_all_views(&mut g);
    let err = c.check_errors(&g, r).unwrap_err();
    assert_eq!(err, VerificationError::RaceNotAtomic { event: r, other: data });
    assert_eq!(err.kind(), ErrorKind::RaceNotAtomic);
}

#[test]
fn test_free_racing_with_access() {
    let c = create(&CheckerConfig::new(ModelType::Rc11));
    let mut g = ExecutionGraph::new();
    let p = Addr::heap(0);
    g.add_malloc(ThreadId::MAIN, p, 16);
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    let w = g.add_write(t1, p, RLX, CoPlacement::Max);
    let f = g.add_free(ThreadId::MAIN, p);
    c.update_all_views(&mut g);
    assert_eq!(
        c.check_errors(&g, f),
        Err(VerificationError::AccessFreed { event: f, other: w })
    );
}

#[test]
fn test_double_free_across_threads() {
    let c = create(&CheckerConfig::new(ModelType::Sc));
    let mut g = ExecutionGraph::new();
    let p = Addr::heap(32);
    g.add_malloc(ThreadId::MAIN, p, 8);
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    let first = g.add_free(ThreadId::MAIN, p);
    let second = g.add_free(t1, p);
    c.update_all_views(&mut g);
    assert_eq!(
        c.check_errors(&g, second),
        Err(VerificationError::DoubleFree { event: second, other: first })
    );
}

#[test]
fn test_retire_is_not_an_access() {
    let c = create(&CheckerConfig::new(ModelType::Sc));
    let mut g = ExecutionGraph::new();
    let p = Addr::heap(0);
    g.add_malloc(ThreadId::MAIN, p, 8);
    let w = g.add_write(ThreadId::MAIN, p, NA, CoPlacement::Max);
    let retire = g.add_hp_retire(ThreadId::MAIN, p);
    let r = g.add_read(ThreadId::MAIN, p, NA, w);
    c.update_all_views(&mut g);
    assert_eq!(c.check_errors(&g, retire), Ok(()));
    assert_eq!(c.check_errors(&g, r), Ok(()));
    assert_eq!(g.rf_pred(r), Some(w));
    assert_ne!(w, Event::INIT);
}

#[test]
fn test_sc_na_writes_warn_once() {
    let c = create(&CheckerConfig::new(ModelType::Sc));
    let mut g = ExecutionGraph::new();
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    let a = g.add_write(ThreadId::MAIN, Addr::global(0), NA, CoPlacement::Max);
    let b = g.add_write(t1, Addr::global(0), NA, CoPlacement::Max);
    c.update_all_views(&mut g);

    assert_eq!(
        c.check_errors(&g, b),
        Err(VerificationError::RaceNotAtomic { event: b, other: a })
    );
    let mut seen = HashSet::new();
    let first = c.check_warnings(&g, b, &seen);
    assert_eq!(first.len(), 1);
    seen.extend(first.iter().map(VerificationError::kind));
    assert!(c.check_warnings(&g, b, &seen).is_empty());
    assert!(c.check_warnings(&g, a, &seen).is_empty());
}
