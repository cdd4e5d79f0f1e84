//! Derived relations shared by several models
//!
//! Forward notation throughout: `seq([a, b])` is `a; b`.

use crate::domain::relation::{alt, seq, step, test, Guard, Rel, Step};

/// View slot of the model's happens-before
pub const HB_VIEW: usize = 0;

/// View slot of happens-before with library-method synchronisation
pub const HB_RELINCHE_VIEW: usize = 1;

/// `po`
pub fn po() -> Rel {
    step(Step::PoImm).plus()
}

/// `[R_rmw]; po_imm; [W_rmw]`
pub fn rmw() -> Rel {
    seq([
        test(Guard::RmwRead),
        step(Step::PoImm),
        test(Guard::RmwWrite),
    ])
}

/// One step of `porf`, including thread create and join
pub fn porf_step() -> Rel {
    alt([
        step(Step::PoImm),
        step(Step::Rf),
        step(Step::Tc),
        step(Step::Tj),
    ])
}

/// `SC` total order primitives: `po | rf | co | fr | tc | tj`
pub fn sc_order() -> Rel {
    alt([
        step(Step::PoImm),
        step(Step::Rf),
        step(Step::CoImm),
        step(Step::FrImm),
        step(Step::Tc),
        step(Step::Tj),
    ])
}

/// Release sequence: `[W]; po|loc?; [W_at]; (rf; rmw)*`
pub fn release_sequence() -> Rel {
    seq([
        test(Guard::Write),
        step(Step::PoLocImm).plus().opt(),
        test(Guard::Write.and(Guard::Atomic)),
        seq([step(Step::Rf), rmw()]).star(),
    ])
}

/// Synchronises-with:
/// `[Rel]; ([F]; po)?; rs; rf; [R_at]; (po; [F])?; [Acq]`
pub fn synchronizes_with() -> Rel {
    seq([
        test(Guard::AtLeastRelease),
        seq([test(Guard::Fence), po()]).opt(),
        release_sequence(),
        step(Step::Rf),
        test(Guard::Read.and(Guard::Atomic)),
        seq([po(), test(Guard::Fence)]).opt(),
        test(Guard::AtLeastAcquire),
    ])
}

/// One step of C11-style happens-before: `po | sw | tc | tj`
pub fn hb_step() -> Rel {
    alt([
        step(Step::PoImm),
        synchronizes_with(),
        step(Step::Tc),
        step(Step::Tj),
    ])
}

/// One step of happens-before where reads inside library methods
/// synchronise with the writes they observe
pub fn hb_relinche_step() -> Rel {
    alt([
        hb_step(),
        seq([step(Step::Rf), test(Guard::Read.and(Guard::InMethod))]),
    ])
}

/// C11-style happens-before
pub fn hb() -> Rel {
    hb_step().plus()
}

/// Extended coherence order: `(rf | co | fr)+`
pub fn eco() -> Rel {
    alt([step(Step::Rf), step(Step::CoImm), step(Step::FrImm)]).plus()
}

/// Coherence: `acyclic(hb|loc | rf | co | fr)` for the view in `slot`
pub fn coherence(slot: usize) -> Rel {
    alt([
        step(Step::HbLoc(slot)),
        step(Step::Rf),
        step(Step::CoImm),
        step(Step::FrImm),
    ])
}

/// Per-location coherence over program order: `acyclic(po|loc | rf | co | fr)`
pub fn po_loc_coherence() -> Rel {
    alt([
        step(Step::PoLocImm),
        step(Step::Rf),
        step(Step::CoImm),
        step(Step::FrImm),
    ])
}

/// `[F_sc]`
pub fn sc_fence() -> Guard {
    Guard::Fence.and(Guard::Sc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acyclicity_relations_are_not_nullable() {
        for rel in [
            porf_step(),
            sc_order(),
            hb_step(),
            hb_relinche_step(),
            hb(),
            eco(),
            coherence(HB_VIEW),
            po_loc_coherence(),
        ] {
            assert!(!rel.is_nullable(), "{rel:?}");
        }
    }

    #[test]
    fn test_release_sequence_steps() {
        let a = release_sequence().compile();
        assert!(a.steps().contains(&Step::PoLocImm));
        assert!(a.steps().contains(&Step::Rf));
        assert!(a.steps().contains(&Step::PoImm));
    }
}
