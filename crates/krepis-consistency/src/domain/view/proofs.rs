//! Kani Formal Verification Proofs
//!
//! Join-semilattice laws of `View` over two threads with small indices.

#![cfg(kani)]

use super::vector_clock::{VectorClock, View};
use crate::domain::graph::{Event, ThreadId};

fn any_event() -> Event {
    let thread: u32 = kani::any();
    let index: u32 = kani::any();
    kani::assume(thread < 2);
    kani::assume(index < 4);
    Event::new(ThreadId(thread), index)
}

fn any_view() -> View {
    let mut view = View::new();
    if kani::any() {
        view.update_idx(any_event());
    }
    if kani::any() {
        view.update_idx(any_event());
    }
    view
}

/// `a ⊔ b` contains exactly what `a` or `b` contains
#[kani::proof]
#[kani::unwind(4)]
fn proof_update_is_join() {
    let a = any_view();
    let b = any_view();
    let e = any_event();

    let mut joined = a.clone();
    joined.update(&b);

    kani::assert(
        joined.contains(e) == (a.contains(e) || b.contains(e)),
        "join must be the union of both prefixes",
    );
}

/// Join is commutative
#[kani::proof]
#[kani::unwind(4)]
fn proof_update_commutes() {
    let a = any_view();
    let b = any_view();

    let mut ab = a.clone();
    ab.update(&b);
    let mut ba = b.clone();
    ba.update(&a);

    kani::assert(ab == ba, "a ⊔ b must equal b ⊔ a");
}

/// `update_idx` is monotone
#[kani::proof]
#[kani::unwind(4)]
fn proof_update_idx_monotone() {
    let mut view = any_view();
    let before = view.clone();
    let e = any_event();
    view.update_idx(e);

    kani::assert(view.contains(e), "bumped event must be contained");
    kani::assert(before.is_subset_of(&view), "bump must not drop events");
}
