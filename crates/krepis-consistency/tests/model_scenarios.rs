//! Classic litmus shapes checked under every model
//!
//! Each scenario is built once per model; the table lists the expected
//! verdict in `ModelType::ALL` order (SC, TSO, RA, RC11, IMM).

use krepis_consistency::{
    create, Addr, CheckerConfig, CoPlacement, ConsistencyChecker, Deps, Event, ExecutionGraph,
    MemOrdering, ModelType, ThreadId, VectorClock,
};
use smallvec::smallvec;

const X: Addr = Addr::global(0);
const Y: Addr = Addr::global(8);
const RLX: MemOrdering = MemOrdering::Relaxed;
const REL: MemOrdering = MemOrdering::Release;
const ACQ: MemOrdering = MemOrdering::Acquire;

fn verdicts(build: impl Fn(&mut ExecutionGraph)) -> Vec<bool> {
    ModelType::ALL
        .into_iter()
        .map(|model| {
            let checker = create(&CheckerConfig::new(model));
            let mut g = ExecutionGraph::new();
            build(&mut g);
            checker.update_all_views(&mut g);
            checker.is_graph_consistent(&g)
        })
        .collect()
}

fn store_buffering(g: &mut ExecutionGraph) {
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    g.add_write(ThreadId::MAIN, X, RLX, CoPlacement::Max);
    g.add_read(ThreadId::MAIN, Y, RLX, Event::INIT);
    g.add_write(t1, Y, RLX, CoPlacement::Max);
    g.add_read(t1, X, RLX, Event::INIT);
}

fn message_passing(write: MemOrdering, read: MemOrdering) -> impl Fn(&mut ExecutionGraph) {
    move |g| {
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        g.add_write(ThreadId::MAIN, X, RLX, CoPlacement::Max);
        let wy = g.add_write(ThreadId::MAIN, Y, write, CoPlacement::Max);
        g.add_read(t1, Y, read, wy);
        g.add_read(t1, X, RLX, Event::INIT);
    }
}

fn load_buffering(with_deps: bool) -> impl Fn(&mut ExecutionGraph) {
    move |g| {
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let rx = g.add_read(ThreadId::MAIN, X, RLX, Event::INIT);
        let wy = g.add_write(ThreadId::MAIN, Y, RLX, CoPlacement::Max);
        let ry = g.add_read(t1, Y, RLX, wy);
        let wx = g.add_write(t1, X, RLX, CoPlacement::Max);
        g.change_rf(rx, wx);
        if with_deps {
            g.set_deps(wy, Deps { data: smallvec![rx], ..Deps::default() });
            g.set_deps(wx, Deps { ctrl: smallvec![ry], ..Deps::default() });
        }
    }
}

#[test]
fn test_store_buffering() {
    assert_eq!(verdicts(store_buffering), [false, true, true, true, true]);
}

#[test]
fn test_message_passing_relaxed() {
    assert_eq!(verdicts(message_passing(RLX, RLX)), [false, false, false, true, true]);
}

#[test]
fn test_message_passing_release_acquire() {
    assert_eq!(verdicts(message_passing(REL, ACQ)), [false; 5]);
}

#[test]
fn test_load_buffering() {
    assert_eq!(verdicts(load_buffering(false)), [false, false, false, false, true]);
    assert_eq!(verdicts(load_buffering(true)), [false; 5]);
}

#[test]
fn test_coherence_of_reads() {
    // CoRR: two reads of one thread observe writes against coherence
    let build = |g: &mut ExecutionGraph| {
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let w1 = g.add_write(ThreadId::MAIN, X, RLX, CoPlacement::Max);
        let w2 = g.add_write(ThreadId::MAIN, X, RLX, CoPlacement::Max);
        g.add_read(t1, X, RLX, w2);
        g.add_read(t1, X, RLX, w1);
    };
    assert_eq!(verdicts(build), [false; 5]);
}

#[test]
fn test_release_acquire_handoff_hb_view() {
    for model in [ModelType::Ra, ModelType::Rc11, ModelType::Imm] {
        let checker = create(&CheckerConfig::new(model));
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let wy = g.add_write(ThreadId::MAIN, Y, MemOrdering::NotAtomic, CoPlacement::Max);
        let flag = g.add_write(ThreadId::MAIN, X, REL, CoPlacement::Max);
        let acq = g.add_read(t1, X, ACQ, flag);
        let ry = g.add_read(t1, Y, MemOrdering::NotAtomic, wy);
        checker.update_all_views(&mut g);

        assert!(checker.hb_view(&g, acq).contains(wy), "{model}");
        assert!(checker.is_consistent(&g, acq), "{model}");
        assert!(checker.is_consistent(&g, ry), "{model}");
        assert_eq!(checker.check_errors(&g, ry), Ok(()), "{model}");
    }
}

#[test]
fn test_incremental_matches_full_on_store_buffering() {
    for model in ModelType::ALL {
        let checker = create(&CheckerConfig::new(model));
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        checker.update_all_views(&mut g);

        let steps: [(ThreadId, bool, Addr); 4] = [
            (ThreadId::MAIN, true, X),
            (ThreadId::MAIN, false, Y),
            (t1, true, Y),
            (t1, false, X),
        ];
        for (t, is_write, addr) in steps {
            let e = if is_write {
                g.add_write(t, addr, MemOrdering::SeqCst, CoPlacement::Max)
            } else {
                g.add_read(t, addr, MemOrdering::SeqCst, Event::INIT)
            };
            checker.update_mm_views(&mut g, e);
            assert_eq!(
                checker.is_consistent(&g, e),
                checker.is_graph_consistent(&g),
                "{model} at {e}"
            );
        }
    }
}

#[test]
fn test_thread_join_orders_child_before_parent() {
    for model in ModelType::ALL {
        let checker = create(&CheckerConfig::new(model));
        let mut g = ExecutionGraph::new();
        let (_, t1) = g.create_thread(ThreadId::MAIN);
        let w = g.add_write(t1, X, MemOrdering::NotAtomic, CoPlacement::Max);
        g.finish_thread(t1);
        g.join_thread(ThreadId::MAIN, t1);
        let r = g.add_read(ThreadId::MAIN, X, MemOrdering::NotAtomic, Event::INIT);
        checker.update_all_views(&mut g);

        assert!(checker.hb_view(&g, r).contains(w), "{model}");
        assert!(!checker.is_consistent(&g, r), "{model}");
        assert_eq!(checker.coherent_stores(&g, r), vec![w], "{model}");
    }
}
