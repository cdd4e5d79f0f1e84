//! Store, placement and revisit selection
//!
//! A location's coherence order splits, relative to an event, into writes
//! that must come before it, writes it may still be ordered against, and
//! (for dependency-tracking models) writes that must come after it.
//!
//! ```text
//! co:   w0  w1  w2 | w3  w4  w5 | w6
//!       ─ before ─   ─ window ─   after
//!                ^ last write (or reader of it) hb-before the event
//! ```
//!
//! Porf-acyclic models never see a write hb-after a fresh event, so their
//! window always extends to the end of `co`.

use super::core::CheckerCore;
use super::derived::HB_VIEW;
use crate::domain::graph::{Addr, Event, ExecutionGraph};
use crate::domain::view::{PrefixView, VectorClock, View};
use tracing::trace;

/// Happens-before of the events po-before `e`
pub fn hb_before(g: &ExecutionGraph, e: Event) -> View {
    match g.po_imm_pred(e) {
        Some(p) => g.label(p).view(HB_VIEW).clone(),
        None => View::from_event(Event::INIT),
    }
}

/// Whether `w`, or some read observing it, is in `before`
pub fn is_write_rf_before(g: &ExecutionGraph, w: Event, addr: Addr, before: &View) -> bool {
    w.is_init()
        || before.contains(w)
        || g.readers_of(w, addr).iter().any(|&r| before.contains(r))
}

fn is_po_before(a: Event, b: Event) -> bool {
    !a.is_init() && a.thread == b.thread && a.index < b.index
}

/// Index one past the last write of `co` that must precede an event whose
/// po-prefix has happens-before `before`
fn split_begin(g: &ExecutionGraph, co: &[Event], addr: Addr, before: &View) -> usize {
    co.iter()
        .rposition(|&w| is_write_rf_before(g, w, addr, before))
        .map_or(0, |i| i + 1)
}

#[inline]
fn pred_at(co: &[Event], p: usize) -> Event {
    if p == 0 {
        Event::INIT
    } else {
        co[p - 1]
    }
}

/// Writes `read` may observe, in coherence order
///
/// # Panics
///
/// If `read` is not a read.
pub fn coherent_stores(core: &CheckerCore, g: &ExecutionGraph, read: Event) -> Vec<Event> {
    let Some(addr) = g.label(read).as_read().map(|r| r.addr) else {
        panic!("coherent stores requested for non-read {read}");
    };
    let co = g.co(addr);
    let Some(&co_max) = co.last() else {
        return vec![Event::INIT];
    };
    if is_po_before(co_max, read) {
        trace!(read = %read, store = %co_max, "coherence-maximal store is po-before");
        return vec![co_max];
    }

    let before = hb_before(g, read);
    let begin = split_begin(g, co, addr, &before);
    let end = if core.is_dep_tracking() {
        upper_split_for_read(g, co, addr, read, begin)
    } else {
        co.len()
    };

    let mut stores = Vec::with_capacity(end - begin + 1);
    stores.push(pred_at(co, begin));
    stores.extend_from_slice(&co[begin..end]);
    trace!(read = %read, count = stores.len(), "coherent stores");
    stores
}

// First write hb-after the read is excluded; a write read by some event
// hb-after the read is the last candidate. An initializer read hb-after the
// read leaves no candidate past the lower split.
fn upper_split_for_read(
    g: &ExecutionGraph,
    co: &[Event],
    addr: Addr,
    read: Event,
    begin: usize,
) -> usize {
    let init_observed_later = g
        .readers_of(Event::INIT, addr)
        .iter()
        .any(|&r| r != read && g.label(r).view(HB_VIEW).contains(read));
    if init_observed_later {
        return begin;
    }
    for (i, &w) in co.iter().enumerate().skip(begin) {
        if g.label(w).view(HB_VIEW).contains(read) {
            return i;
        }
        let observed_later = g
            .readers_of(w, addr)
            .iter()
            .any(|&r| r != read && g.label(r).view(HB_VIEW).contains(read));
        if observed_later {
            return i + 1;
        }
    }
    co.len()
}

/// Writes `write` may be placed immediately after, in coherence order
///
/// An RMW write has exactly one placement: right after the write its read
/// observed.
///
/// # Panics
///
/// If `write` is not a write, or is an RMW write whose po-predecessor is
/// not the read half of an RMW.
pub fn coherent_placings(core: &CheckerCore, g: &ExecutionGraph, write: Event) -> Vec<Event> {
    let lab = g.label(write);
    let Some(access) = lab.as_write() else {
        panic!("coherent placings requested for non-write {write}");
    };
    let addr = access.addr;

    if access.rmw.is_some() {
        let paired = write.prev().and_then(|r| g.label(r).as_read());
        return match paired {
            Some(r) if r.rmw.is_some() => vec![r.rf],
            _ => panic!("RMW write {write} without a paired RMW read"),
        };
    }

    let co: Vec<Event> = g.co(addr).iter().copied().filter(|&w| w != write).collect();
    let Some(&co_max) = co.last() else {
        return vec![Event::INIT];
    };
    if is_po_before(co_max, write) {
        return vec![co_max];
    }

    let before = hb_before(g, write);
    let begin = split_begin(g, &co, addr, &before);
    let end = if core.is_dep_tracking() {
        upper_split_for_write(g, &co, addr, write, begin)
    } else {
        co.len()
    };

    (begin..=end)
        .filter(|&p| !splits_rmw(g, &co, p))
        .map(|p| pred_at(&co, p))
        .collect()
}

fn upper_split_for_write(
    g: &ExecutionGraph,
    co: &[Event],
    addr: Addr,
    write: Event,
    begin: usize,
) -> usize {
    co.iter()
        .enumerate()
        .skip(begin)
        .find(|&(_, &w)| {
            g.label(w).view(HB_VIEW).contains(write)
                || g.readers_of(w, addr)
                    .iter()
                    .any(|&r| g.label(r).view(HB_VIEW).contains(write))
        })
        .map_or(co.len(), |(i, _)| i)
}

// Inserting at position `p` would separate `co[p]` from its RMW source.
fn splits_rmw(g: &ExecutionGraph, co: &[Event], p: usize) -> bool {
    let Some(&next) = co.get(p) else {
        return false;
    };
    if !g.label(next).is_rmw_write() {
        return false;
    }
    let source = next.prev().and_then(|r| g.rf_pred(r));
    source == Some(pred_at(co, p))
}

/// Reads `w` may revisit, given `w`'s causal prefix
pub fn coherent_revisits(
    core: &CheckerCore,
    g: &ExecutionGraph,
    w: Event,
    pporf: &PrefixView,
) -> Vec<Event> {
    let mut reads = g.revisitable(w, pporf);
    if let Some(pending) = g.pending_rmw(w) {
        let limit = g.label(pending).stamp();
        reads.retain(|&r| g.label(r).stamp() <= limit);
    }
    filter_coherent_revisits(core, g, w, reads)
}

/// Drop the reads that could not observe `w` coherently
///
/// # Panics
///
/// If `w` is not a write.
pub fn filter_coherent_revisits(
    core: &CheckerCore,
    g: &ExecutionGraph,
    w: Event,
    mut reads: Vec<Event>,
) -> Vec<Event> {
    let Some(addr) = g.label(w).as_write().map(|a| a.addr) else {
        panic!("revisits requested for non-write {w}");
    };
    if !core.is_dep_tracking() && g.is_co_maximal(addr, w) {
        return reads;
    }

    // reads already ordered after some co-later write
    let succs = g.co_succs(w);
    reads.retain(|&r| {
        let before = hb_before(g, r);
        !succs
            .iter()
            .any(|&s| is_write_rf_before(g, s, addr, &before))
    });

    if core.is_dep_tracking() {
        // reads hb-before w, its co-predecessors, or their readers, when that
        // event is kept by the revisit
        let prefix = core.calculate_prefix_view(g, w);
        let mut anchors = vec![w];
        anchors.extend(g.readers_of(w, addr).iter().copied());
        for p in g.co_preds(w) {
            if !p.is_init() {
                anchors.push(p);
            }
            anchors.extend(g.readers_of(p, addr).iter().copied());
        }
        reads.retain(|&r| {
            let kept = g.view_from_stamp(g.label(r).stamp());
            !anchors.iter().any(|&y| {
                y != r
                    && (kept.contains(y) || prefix.contains(y))
                    && g.label(y).view(HB_VIEW).contains(r)
            })
        });
    }
    trace!(write = %w, count = reads.len(), "coherent revisits");
    reads
}
