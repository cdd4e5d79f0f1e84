//! Primitive relation steps
//!
//! Each step is one edge kind of the execution graph, resolved in the
//! predecessor direction: `collect_preds(Rf, r)` yields the write `r`
//! observes. `has_succ` answers the dual question exactly, which the
//! incremental checks use to skip labels that cannot close a cycle.

use crate::domain::graph::{Event, EventLabel, ExecutionGraph, LabelKind};
use crate::domain::view::VectorClock;
use smallvec::SmallVec;

/// Predecessor buffer; most steps yield at most a couple of events
pub type Preds = SmallVec<[Event; 4]>;

/// Primitive edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Immediate program order
    PoImm,
    /// Immediate program order restricted to the same location
    PoLocImm,
    /// Program order between events not accessing the same location
    PoDiffLoc,
    /// Reads-from
    Rf,
    /// External reads-from
    Rfe,
    /// Internal reads-from
    Rfi,
    /// Immediate coherence order
    CoImm,
    /// Immediate from-read
    FrImm,
    /// Thread create
    Tc,
    /// Thread join
    Tj,
    /// Data dependency
    Data,
    /// Address dependency
    Addr,
    /// Control dependency
    Ctrl,
    /// `(coe; rfe) ∩ po`
    Detour,
    /// Same-location restriction of the relation whose view lives in the
    /// given slot
    HbLoc(usize),
}

impl Step {
    /// Push the predecessors of `e` along this step into `out`
    pub fn collect_preds(self, g: &ExecutionGraph, e: Event, out: &mut Preds) {
        match self {
            Self::PoImm => out.extend(g.po_imm_pred(e)),
            Self::PoLocImm => out.extend(g.poloc_imm_pred(e)),
            Self::PoDiffLoc => {
                let addr = g.label(e).access_addr();
                out.extend(g.po_preds(e).filter(|&p| {
                    addr.is_none() || g.label(p).access_addr() != addr
                }));
            }
            Self::Rf => out.extend(g.rf_pred(e)),
            Self::Rfe => out.extend(g.rfe_pred(e)),
            Self::Rfi => out.extend(g.rfi_pred(e)),
            Self::CoImm => out.extend(g.co_imm_pred(e)),
            Self::FrImm => out.extend(g.fr_imm_preds(e)),
            Self::Tc => out.extend(g.tc_pred(e)),
            Self::Tj => out.extend(g.tj_pred(e)),
            Self::Data => out.extend_from_slice(g.data_preds(e)),
            Self::Addr => out.extend_from_slice(g.addr_preds(e)),
            Self::Ctrl => out.extend_from_slice(g.ctrl_preds(e)),
            Self::Detour => out.extend(g.detour_preds(e)),
            Self::HbLoc(slot) => {
                let lab = g.label(e);
                if lab.access_addr().is_none() || !lab.has_views() {
                    return;
                }
                let view = lab.view(slot);
                out.extend(g.samelocs(e).into_iter().filter(|&x| view.contains(x)));
            }
        }
    }

    /// Whether `lab` is a predecessor of some event along this step
    pub fn has_succ(self, g: &ExecutionGraph, lab: &EventLabel) -> bool {
        let e = lab.pos();
        match self {
            Self::PoImm | Self::PoDiffLoc | Self::Detour => g.po_imm_succ(e).is_some(),
            Self::PoLocImm => g.poloc_imm_succ(e).is_some(),
            // dependencies only point forward within a thread
            Self::Data | Self::Addr | Self::Ctrl => g.po_imm_succ(e).is_some(),
            Self::Rf => !g.rf_succs(e).is_empty(),
            Self::Rfe => g.rf_succs(e).iter().any(|&r| r.is_external_to(e)),
            Self::Rfi => g.rf_succs(e).iter().any(|&r| !r.is_external_to(e)),
            Self::CoImm => {
                if e.is_init() {
                    g.locations().any(|addr| !g.co(addr).is_empty())
                } else {
                    g.co_imm_succ(e).is_some()
                }
            }
            Self::FrImm => g.fr_imm_succ(e).is_some(),
            Self::Tc => g.tc_succ(e).is_some(),
            Self::Tj => !g.tj_succs(e).is_empty(),
            Self::HbLoc(slot) => g.samelocs(e).into_iter().any(|x| {
                let other = g.label(x);
                other.has_views() && other.view(slot).contains(e)
            }),
        }
    }

    /// Whether `lab` starts no edge along any of `steps`
    pub fn is_sink(steps: &[Self], g: &ExecutionGraph, lab: &EventLabel) -> bool {
        !matches!(lab.kind(), LabelKind::Init) && steps.iter().all(|s| !s.has_succ(g, lab))
    }
}
