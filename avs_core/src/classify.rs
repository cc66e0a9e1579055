//! Classification engine for one phase's derived indices.
//!
//! This module implements the decision procedure:
//! - Check per-side cannulation against the phase selectivity threshold
//! - Lateralize on LI when both sides are cannulated
//! - Fall back to cannulation-independent rescue criteria when one side
//!   failed
//! - Compare the LI verdict with the corroborating indices and preserve
//!   any disagreement instead of picking a winner

use crate::criteria::{CriteriaCatalog, PhaseCriteria};
use crate::types::{
    Classification, Conclusion, Confidence, ConflictDetails, DerivedRatios, EquivocalLean,
    ProtocolPhase, RuleCitation, Side,
};

/// Classify one phase's ratios under a criteria catalog
///
/// Always returns a displayable verdict; conditions that abort the
/// pipeline (missing samples, unknown units) are raised before the
/// ratios exist. Advisory findings travel separately as warnings.
pub fn classify(ratios: &DerivedRatios, catalog: &CriteriaCatalog) -> Classification {
    let criteria = catalog.for_phase(ratios.phase);
    let mut cited: Vec<String> = Vec::new();
    let mut caveats: Vec<String> = Vec::new();

    // Step 1: cannulation check, inclusive threshold. A NaN selectivity
    // index compares false and counts as a failure.
    let left_ok = ratios.si_left >= criteria.si_min;
    let right_ok = ratios.si_right >= criteria.si_min;
    cited.push(si_rule_id(ratios.phase).to_string());

    tracing::info!(
        "Cannulation check ({} phase): left SI {:.2} ({}), right SI {:.2} ({})",
        ratios.phase,
        ratios.si_left,
        if left_ok { "pass" } else { "fail" },
        ratios.si_right,
        if right_ok { "pass" } else { "fail" },
    );

    let conclusion = match (left_ok, right_ok) {
        (false, false) => {
            caveats.push(format!(
                "Neither adrenal vein met the selectivity threshold of {} \
                 (left SI {:.2}, right SI {:.2}); the study cannot be interpreted.",
                criteria.si_min, ratios.si_left, ratios.si_right
            ));
            Conclusion::InsufficientData
        }
        (true, false) => rescue(ratios, criteria, Side::Left, &mut cited, &mut caveats),
        (false, true) => rescue(ratios, criteria, Side::Right, &mut cited, &mut caveats),
        (true, true) => lateralize(ratios, criteria, &mut cited, &mut caveats),
    };

    tracing::info!("Classification ({} phase): {}", ratios.phase, conclusion);

    Classification {
        conclusion,
        citations: collect_citations(catalog, &cited),
        caveats,
    }
}

/// Step 2: primary lateralization when both sides are cannulated,
/// followed by the corroboration/conflict comparison
fn lateralize(
    ratios: &DerivedRatios,
    criteria: &PhaseCriteria,
    cited: &mut Vec<String>,
    caveats: &mut Vec<String>,
) -> Conclusion {
    let li = ratios.li;

    if li.is_nan() {
        caveats.push(
            "The lateralization index is undefined for these inputs; \
             check the companion analyte values."
                .to_string(),
        );
        return Conclusion::InsufficientData;
    }

    let primary = if li > criteria.li_unilateral {
        cited.push(li_unilateral_rule_id(ratios.phase).to_string());
        Conclusion::Unilateral {
            side: ratios.dominant,
            confidence: Confidence::Moderate,
            rescue: false,
        }
    } else if li < criteria.li_bilateral {
        cited.push(li_bilateral_rule_id(ratios.phase).to_string());
        Conclusion::Bilateral
    } else {
        cited.push(li_unilateral_rule_id(ratios.phase).to_string());
        cited.push(li_bilateral_rule_id(ratios.phase).to_string());
        let lean = if (li - 2.0).abs() <= (li - 3.0).abs() {
            EquivocalLean::NearBilateral
        } else {
            EquivocalLean::NearUnilateral
        };
        caveats.push(equivocal_guidance(li, lean, criteria));
        Conclusion::Equivocal { lean }
    };

    // Step 3: the corroborating indices are computed independently of
    // LI; a disagreement with a definite LI verdict is preserved.
    let corroborator = corroborate(ratios, criteria, cited);

    match (primary, corroborator) {
        (
            Conclusion::Unilateral { side, rescue, .. },
            Some((corroborated_side, description)),
        ) if side == corroborated_side => {
            caveats.push(format!(
                "Cannulation-independent indices agree: {description}."
            ));
            Conclusion::Unilateral {
                side,
                confidence: Confidence::High,
                rescue,
            }
        }
        // the corroborator always names the dominant side, which is the
        // side an LI verdict names as well, so the remaining unilateral
        // arm cannot disagree on laterality
        (primary @ Conclusion::Unilateral { .. }, _) => primary,
        (Conclusion::Bilateral, Some((side, description))) => {
            let summary = format!(
                "The lateralization index ({li:.2}) indicates bilateral disease \
                 while {description} favors the {side} side."
            );
            tracing::warn!("Conflicting criteria: {}", summary);
            Conclusion::ConflictingCriteria {
                details: ConflictDetails {
                    primary: Box::new(Conclusion::Bilateral),
                    corroborating: Box::new(Conclusion::Unilateral {
                        side,
                        confidence: Confidence::Moderate,
                        rescue: false,
                    }),
                    summary,
                },
            }
        }
        (primary @ Conclusion::Equivocal { .. }, Some((side, description))) => {
            caveats.push(format!(
                "Cannulation-independent indices favor the {side} side ({description})."
            ));
            primary
        }
        (primary, None) => primary,
        // InsufficientData returned above before this point
        (primary, _) => primary,
    }
}

/// Step 2b: one side failed selectivity
///
/// The failed specimen is non-selective, so the rescue judges the
/// cannulated side's AV/IVC ratio against the suppression and secretion
/// thresholds. Either criterion supports a unilateral call on the
/// cannulated side, flagged low-confidence with an explicit caveat.
fn rescue(
    ratios: &DerivedRatios,
    criteria: &PhaseCriteria,
    cannulated: Side,
    cited: &mut Vec<String>,
    caveats: &mut Vec<String>,
) -> Conclusion {
    let failed = cannulated.opposite();
    let avivc = ratios.avivc(cannulated);

    let suppressed = avivc < criteria.csi_max;
    let secreting = avivc > criteria.rasi_min;

    tracing::info!(
        "Rescue evaluation: {} side failed, {} AV/IVC {:.2} (suppression < {}, secretion > {})",
        failed,
        cannulated,
        avivc,
        criteria.csi_max,
        criteria.rasi_min,
    );

    if !suppressed && !secreting {
        caveats.push(format!(
            "Selectivity failed on the {failed} side (SI {:.2} < {}) and no \
             cannulation-independent criterion was met.",
            ratios.si(failed),
            criteria.si_min
        ));
        return Conclusion::CannulationFailed { side: failed };
    }

    caveats.push(format!(
        "Selectivity failed on the {failed} side; classic lateralization could \
         not be computed."
    ));
    if suppressed {
        cited.push("csi".to_string());
        caveats.push(format!(
            "The {cannulated} AV/IVC ratio ({avivc:.2}) met the \
             contralateral-suppression criterion (< {}).",
            criteria.csi_max
        ));
    }
    if secreting {
        cited.push("rasi".to_string());
        caveats.push(format!(
            "The {cannulated} AV/IVC ratio ({avivc:.2}) met the secretion \
             criterion (> {}).",
            criteria.rasi_min
        ));
    }

    Conclusion::Unilateral {
        side: cannulated,
        confidence: Confidence::Low,
        rescue: true,
    }
}

/// Evaluate the corroborating indices on the dominance-based values
///
/// Returns the favored side and a short description of what fired, or
/// `None` when neither criterion is met (silence, not a bilateral
/// claim).
fn corroborate(
    ratios: &DerivedRatios,
    criteria: &PhaseCriteria,
    cited: &mut Vec<String>,
) -> Option<(Side, String)> {
    let suppressed = ratios.csi < criteria.csi_max;
    let secreting = ratios.rasi > criteria.rasi_min;

    if !suppressed && !secreting {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    if suppressed {
        cited.push("csi".to_string());
        parts.push(format!(
            "contralateral suppression (CSI {:.2} < {})",
            ratios.csi, criteria.csi_max
        ));
    }
    if secreting {
        cited.push("rasi".to_string());
        parts.push(format!(
            "dominant-side secretion (RASI {:.2} > {})",
            ratios.rasi, criteria.rasi_min
        ));
    }

    Some((ratios.dominant, parts.join(" and ")))
}

fn equivocal_guidance(li: f64, lean: EquivocalLean, criteria: &PhaseCriteria) -> String {
    let reading = match lean {
        EquivocalLean::NearBilateral => "closer to 2, nearer a bilateral pattern",
        EquivocalLean::NearUnilateral => "closer to 3, nearer a unilateral pattern",
    };
    format!(
        "LI {li:.2} lies in the indeterminate band between {} and {} ({reading}); \
         consider repeat sampling or adjunctive imaging.",
        criteria.li_bilateral, criteria.li_unilateral
    )
}

fn si_rule_id(phase: ProtocolPhase) -> &'static str {
    match phase {
        ProtocolPhase::Pre => "si_pre",
        ProtocolPhase::Post => "si_post",
    }
}

fn li_unilateral_rule_id(phase: ProtocolPhase) -> &'static str {
    match phase {
        ProtocolPhase::Pre => "li_uni_pre",
        ProtocolPhase::Post => "li_uni_post",
    }
}

fn li_bilateral_rule_id(phase: ProtocolPhase) -> &'static str {
    match phase {
        ProtocolPhase::Pre => "li_bi_pre",
        ProtocolPhase::Post => "li_bi_post",
    }
}

/// Resolve cited rule ids against the catalog, first occurrence wins
fn collect_citations(catalog: &CriteriaCatalog, cited: &[String]) -> Vec<RuleCitation> {
    let mut citations: Vec<RuleCitation> = Vec::new();
    for id in cited {
        if citations.iter().any(|c| &c.rule_id == id) {
            continue;
        }
        citations.push(catalog.cite(id));
    }
    citations
}
