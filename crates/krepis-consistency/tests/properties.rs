//! Property tests over randomly generated two-thread graphs

use krepis_consistency::{
    create, Addr, CheckerConfig, CoPlacement, ConsistencyChecker, Event, ExecutionGraph,
    MemOrdering, ModelType, PrefixView, ThreadId, VectorClock, View,
};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Read { main: bool, loc: u8, ord: u8, pick: usize },
    Write { main: bool, loc: u8, ord: u8, pick: usize },
    Fence { main: bool, ord: u8 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), 0..2u8, 0..3u8, any::<usize>())
            .prop_map(|(main, loc, ord, pick)| Op::Read { main, loc, ord, pick }),
        4 => (any::<bool>(), 0..2u8, 0..3u8, any::<usize>())
            .prop_map(|(main, loc, ord, pick)| Op::Write { main, loc, ord, pick }),
        1 => (any::<bool>(), 0..3u8).prop_map(|(main, ord)| Op::Fence { main, ord }),
    ]
}

fn program(max: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(), 1..=max)
}

const fn location(loc: u8) -> Addr {
    Addr::global(loc as u64 * 8)
}

fn read_ordering(ord: u8) -> MemOrdering {
    [MemOrdering::Relaxed, MemOrdering::Acquire, MemOrdering::SeqCst][ord as usize]
}

fn write_ordering(ord: u8) -> MemOrdering {
    [MemOrdering::Relaxed, MemOrdering::Release, MemOrdering::SeqCst][ord as usize]
}

fn fence_ordering(ord: u8) -> MemOrdering {
    [MemOrdering::Acquire, MemOrdering::Release, MemOrdering::SeqCst][ord as usize]
}

fn thread(main: bool, t1: ThreadId) -> ThreadId {
    if main {
        ThreadId::MAIN
    } else {
        t1
    }
}

/// Append `op`, choosing its source and coherence position from `pick`
fn apply(g: &mut ExecutionGraph, t1: ThreadId, op: &Op) -> Event {
    match *op {
        Op::Read { main, loc, ord, pick } => {
            let addr = location(loc);
            let mut sources = vec![Event::INIT];
            sources.extend_from_slice(g.co(addr));
            let rf = sources[pick % sources.len()];
            g.add_read(thread(main, t1), addr, read_ordering(ord), rf)
        }
        Op::Write { main, loc, ord, pick } => {
            let addr = location(loc);
            let co = g.co(addr);
            let at = pick % (co.len() + 1);
            let placement = if at == 0 {
                CoPlacement::After(Event::INIT)
            } else {
                CoPlacement::After(co[at - 1])
            };
            g.add_write(thread(main, t1), addr, write_ordering(ord), placement)
        }
        Op::Fence { main, ord } => g.add_fence(thread(main, t1), fence_ordering(ord)),
    }
}

fn two_threads() -> (ExecutionGraph, ThreadId) {
    let mut g = ExecutionGraph::new();
    let (_, t1) = g.create_thread(ThreadId::MAIN);
    (g, t1)
}

/// Acyclicity of `po | rf | co | fr | tc`, computed directly
fn brute_force_sc(g: &ExecutionGraph) -> bool {
    let mut edges: HashMap<Event, Vec<Event>> = HashMap::new();
    let mut edge = |a: Event, b: Event| edges.entry(a).or_default().push(b);

    for lab in g.labels() {
        let e = lab.pos();
        if let Some(p) = g.po_imm_pred(e) {
            edge(p, e);
        }
        if let Some(c) = g.tc_pred(e) {
            edge(c, e);
        }
        if let Some(read) = lab.as_read() {
            edge(read.rf, e);
            let co = g.co(read.addr);
            let later = match co.iter().position(|&w| w == read.rf) {
                Some(i) => &co[i + 1..],
                None => co,
            };
            for &w in later {
                edge(e, w);
            }
        }
    }
    for addr in g.locations() {
        let mut prev = Event::INIT;
        for &w in g.co(addr) {
            edge(prev, w);
            prev = w;
        }
    }

    // 0 unseen, 1 on stack, 2 done
    let mut color: HashMap<Event, u8> = HashMap::new();
    for lab in g.labels() {
        let root = lab.pos();
        if color.contains_key(&root) {
            continue;
        }
        let mut stack = vec![(root, 0usize)];
        color.insert(root, 1);
        while let Some((e, i)) = stack.pop() {
            let succs = edges.get(&e).map_or(&[][..], Vec::as_slice);
            if let Some(&s) = succs.get(i) {
                stack.push((e, i + 1));
                match color.get(&s).copied().unwrap_or(0) {
                    0 => {
                        color.insert(s, 1);
                        stack.push((s, 0));
                    }
                    1 => return false,
                    _ => {}
                }
            } else {
                color.insert(e, 2);
            }
        }
    }
    true
}

fn is_coherent(checker: &dyn ConsistencyChecker, g: &ExecutionGraph) -> bool {
    checker.first_violation(g) != Some("coherence")
}

/// Build `ops`, reading from an offered store and appending writes to
/// coherence
fn guided(checker: &dyn ConsistencyChecker, ops: &[Op]) -> (ExecutionGraph, ThreadId) {
    let (mut g, t1) = two_threads();
    checker.update_all_views(&mut g);
    for op in ops {
        let e = match *op {
            Op::Read { main, loc, ord, pick } => {
                let r = g.add_read(thread(main, t1), location(loc), read_ordering(ord), Event::INIT);
                let stores = checker.coherent_stores(&g, r);
                g.change_rf(r, stores[pick % stores.len()]);
                r
            }
            Op::Write { main, loc, ord, .. } => {
                g.add_write(thread(main, t1), location(loc), write_ordering(ord), CoPlacement::Max)
            }
            Op::Fence { .. } => apply(&mut g, t1, op),
        };
        checker.update_mm_views(&mut g, e);
    }
    (g, t1)
}

/// Rebuild what remains of `g` once `r` is revisited by `w`: the events
/// added up to `r` and the prefix of `w`, with `r` reading from `w`
fn revisited(g: &ExecutionGraph, r: Event, w: Event, prefix: &PrefixView) -> ExecutionGraph {
    let limit = g.label(r).stamp();
    let kept = |e: Event| e.is_init() || g.label(e).stamp() <= limit || prefix.contains(e);

    let (mut h, _) = two_threads();
    for lab in g.labels() {
        let e = lab.pos();
        if h.contains(e) || !kept(e) {
            continue;
        }
        let added = if let Some(read) = lab.as_read() {
            let rf = if e == r { Event::INIT } else { read.rf };
            h.add_read(e.thread, read.addr, read.ordering, rf)
        } else if let Some(write) = lab.as_write() {
            let placement = if e == w {
                let pred = g.co_preds(w).into_iter().rev().find(|&p| kept(p));
                CoPlacement::After(pred.unwrap_or(Event::INIT))
            } else {
                CoPlacement::Max
            };
            h.add_write(e.thread, write.addr, write.ordering, placement)
        } else if lab.is_fence() {
            let ordering = lab.ordering().unwrap();
            h.add_fence(e.thread, ordering)
        } else {
            panic!("unexpected label at {e}");
        };
        assert_eq!(added, e);
    }
    h.change_rf(r, w);
    h
}

fn view_of(points: &[(u8, u8)]) -> View {
    let mut view = View::new();
    for &(t, i) in points {
        view.update_idx(Event::new(ThreadId(u32::from(t)), u32::from(i)));
    }
    view
}

fn joined(a: &View, b: &View) -> View {
    let mut out = a.clone();
    out.update(b);
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Views form a join-semilattice under `update`
    #[test]
    fn view_join_laws(
        a in prop::collection::vec((0..4u8, 0..6u8), 0..6),
        b in prop::collection::vec((0..4u8, 0..6u8), 0..6),
        c in prop::collection::vec((0..4u8, 0..6u8), 0..6),
    ) {
        let (a, b, c) = (view_of(&a), view_of(&b), view_of(&c));
        prop_assert_eq!(joined(&a, &a), a.clone());
        prop_assert_eq!(joined(&a, &b), joined(&b, &a));
        prop_assert_eq!(joined(&joined(&a, &b), &c), joined(&a, &joined(&b, &c)));
        prop_assert!(a.is_subset_of(&joined(&a, &b)));
    }

    /// Checking only the new event agrees with a full check while the graph
    /// stays consistent
    #[test]
    fn incremental_matches_full(ops in program(8)) {
        for model in ModelType::ALL {
            let checker = create(&CheckerConfig::new(model));
            let (mut g, t1) = two_threads();
            checker.update_all_views(&mut g);
            for op in &ops {
                let e = apply(&mut g, t1, op);
                checker.update_mm_views(&mut g, e);
                let full = checker.is_graph_consistent(&g);
                prop_assert_eq!(checker.is_consistent(&g, e), full, "{} at {}", model, e);
                if !full {
                    break;
                }
            }
        }
    }

    /// Recomputing views gives the same result as computing them once
    #[test]
    fn view_update_is_idempotent(ops in program(8)) {
        for model in ModelType::ALL {
            let checker = create(&CheckerConfig::new(model));
            let (mut g, t1) = two_threads();
            checker.update_all_views(&mut g);
            for op in &ops {
                let e = apply(&mut g, t1, op);
                checker.update_mm_views(&mut g, e);
                let once = checker.hb_view(&g, e).clone();
                checker.update_mm_views(&mut g, e);
                prop_assert_eq!(checker.hb_view(&g, e), &once);
                prop_assert!(once.contains(e));
            }
        }
    }

    /// SC consistency is acyclicity of the union of the base relations
    #[test]
    fn sc_matches_brute_force(ops in program(8)) {
        let checker = create(&CheckerConfig::new(ModelType::Sc));
        let (mut g, t1) = two_threads();
        for op in &ops {
            apply(&mut g, t1, op);
        }
        checker.update_all_views(&mut g);
        prop_assert_eq!(checker.is_graph_consistent(&g), brute_force_sc(&g));
    }

    /// The offered stores are exactly the sources that keep the graph
    /// coherent
    #[test]
    fn stores_are_exact(ops in program(7), main in any::<bool>(), loc in 0..2u8) {
        for model in [ModelType::Ra, ModelType::Rc11, ModelType::Imm] {
            let checker = create(&CheckerConfig::new(model));
            let (mut g, t1) = guided(checker.as_ref(), &ops);
            prop_assert!(is_coherent(checker.as_ref(), &g), "{}", model);

            let addr = location(loc);
            let r = g.add_read(thread(main, t1), addr, MemOrdering::Relaxed, Event::INIT);
            let offered = checker.coherent_stores(&g, r);

            let mut sources = vec![Event::INIT];
            sources.extend_from_slice(g.co(addr));
            let mut coherent = Vec::new();
            for w in sources {
                g.change_rf(r, w);
                checker.update_mm_views(&mut g, r);
                if is_coherent(checker.as_ref(), &g) {
                    coherent.push(w);
                }
            }
            prop_assert_eq!(offered, coherent, "{}", model);
        }
    }

    /// A read is offered for revisiting exactly when the graph left by the
    /// revisit is coherent
    #[test]
    fn revisits_are_exact(
        ops in program(7),
        main in any::<bool>(),
        loc in 0..2u8,
        ord in 0..3u8,
        pick in any::<usize>(),
    ) {
        for model in [ModelType::Ra, ModelType::Rc11] {
            let checker = create(&CheckerConfig::new(model));
            let (mut g, t1) = guided(checker.as_ref(), &ops);
            let addr = location(loc);
            let t = thread(main, t1);

            let mut scratch = g.clone();
            let w = scratch.add_write(t, addr, write_ordering(ord), CoPlacement::Max);
            checker.update_mm_views(&mut scratch, w);
            let placings = checker.coherent_placings(&scratch, w);
            let after = placings[pick % placings.len()];
            prop_assert_eq!(
                g.add_write(t, addr, write_ordering(ord), CoPlacement::After(after)),
                w
            );
            checker.update_mm_views(&mut g, w);
            prop_assert!(is_coherent(checker.as_ref(), &g), "{}", model);

            let prefix = checker.calculate_prefix_view(&g, w);
            let offered = checker.coherent_revisits(&g, w, &prefix);
            let mut coherent = Vec::new();
            for r in g.revisitable(w, &prefix) {
                let mut h = revisited(&g, r, w, &prefix);
                checker.update_all_views(&mut h);
                if is_coherent(checker.as_ref(), &h) {
                    coherent.push(r);
                }
            }
            prop_assert_eq!(offered, coherent, "{}", model);
        }
    }
}
