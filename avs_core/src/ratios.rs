//! Diagnostic index derivation.
//!
//! Pure arithmetic over the three per-phase aggregates. Divisions by
//! zero are left non-finite; the warning detector reports them and the
//! classifier treats an undefined lateralization index as
//! insufficient data.

use crate::types::{AggregatedSite, DerivedRatios, IvcReference, ProtocolPhase, Side};

/// Derive the full index set for one phase
///
/// The dominant side is the one with the larger aldosterone/cortisol
/// (primary/companion) quotient. The lateralization index is computed
/// as dominant over nondominant AC so an undefined AC propagates
/// instead of being masked by a NaN-ignoring max.
pub fn compute_ratios(
    left: &AggregatedSite,
    right: &AggregatedSite,
    ivc: &IvcReference,
    phase: ProtocolPhase,
) -> DerivedRatios {
    let si_left = left.mean_companion / ivc.mean_companion;
    let si_right = right.mean_companion / ivc.mean_companion;

    let ac_left = left.mean_primary / left.mean_companion;
    let ac_right = right.mean_primary / right.mean_companion;
    let ac_ivc = ivc.mean_primary / ivc.mean_companion;

    let dominant = if ac_right > ac_left {
        Side::Right
    } else {
        Side::Left
    };
    let (ac_dominant, ac_nondominant) = match dominant {
        Side::Left => (ac_left, ac_right),
        Side::Right => (ac_right, ac_left),
    };

    let li = ac_dominant / ac_nondominant;
    let cr = ac_nondominant / ac_ivc;
    // numerically the same quotient as CR, held apart because it is
    // judged against the suppression threshold
    let csi = cr;
    let rasi = ac_dominant / ac_ivc;

    DerivedRatios {
        phase,
        si_left,
        si_right,
        ac_left,
        ac_right,
        ac_ivc,
        li,
        cr,
        csi,
        rasi,
        avivc_left: ac_left / ac_ivc,
        avivc_right: ac_right / ac_ivc,
        dominant,
    }
}
