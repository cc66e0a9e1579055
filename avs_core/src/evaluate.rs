//! Case evaluation pipeline.
//!
//! One "calculate" invocation flows through here: raw rows are
//! unit-normalized, capped and aggregated per site, turned into derived
//! indices, classified, and scanned for plausibility advisories. Every
//! invocation builds a fresh evaluation; nothing is retained between
//! calls.

use crate::aggregate::{aggregate, SampleLimits};
use crate::classify::classify;
use crate::criteria::default_criteria;
use crate::error::{Error, Result};
use crate::ratios::compute_ratios;
use crate::types::{
    CaseEvaluation, CaseInput, IvcReference, PhaseEvaluation, PhaseInput, ProtocolPhase, Sample,
    Site, SiteSampleSet,
};
use crate::warnings::detect_warnings;
use chrono::Utc;
use uuid::Uuid;

/// Evaluate a case across its selected phases
///
/// Fatal conditions (a site without a complete sample, a missing phase
/// block, a sample cap violation) abort the whole evaluation; advisory
/// findings are carried per phase in the result.
pub fn evaluate_case(case: &CaseInput, limits: &SampleLimits) -> Result<CaseEvaluation> {
    let mut phases = Vec::new();
    for phase in case.phases.phases() {
        let input = case.phase_input(phase).ok_or_else(|| {
            Error::Case(format!(
                "the case selects the {phase} phase but has no {phase} sample block"
            ))
        })?;
        phases.push(evaluate_phase(case, phase, input, limits)?);
    }

    let evaluation = CaseEvaluation {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        limits: *limits,
        case: case.clone(),
        phases,
    };

    tracing::info!(
        "Evaluated case {} ({} panel, {} phase(s))",
        evaluation.id,
        case.panel,
        evaluation.phases.len()
    );

    Ok(evaluation)
}

/// Evaluate a single phase of a case
pub fn evaluate_phase(
    case: &CaseInput,
    phase: ProtocolPhase,
    input: &PhaseInput,
    limits: &SampleLimits,
) -> Result<PhaseEvaluation> {
    let left_set = build_site_set(case, phase, input, Site::Left, limits)?;
    let right_set = build_site_set(case, phase, input, Site::Right, limits)?;
    let ivc_set = build_site_set(case, phase, input, Site::Ivc, limits)?;

    let left = aggregate(&left_set)?;
    let right = aggregate(&right_set)?;
    let ivc = aggregate(&ivc_set)?;

    let ratios = compute_ratios(&left, &right, &IvcReference::from(&ivc), phase);
    let classification = classify(&ratios, default_criteria(case.panel));
    let warnings = detect_warnings(case.panel, &[&left_set, &right_set, &ivc_set], &ratios);

    Ok(PhaseEvaluation {
        phase,
        left,
        right,
        ivc,
        ratios,
        classification,
        warnings,
    })
}

/// Normalize one site's raw rows into canonical-unit samples
fn build_site_set(
    case: &CaseInput,
    phase: ProtocolPhase,
    input: &PhaseInput,
    site: Site,
    limits: &SampleLimits,
) -> Result<SiteSampleSet> {
    let samples: Vec<Sample> = input
        .rows(site)
        .iter()
        .map(|row| Sample {
            site,
            drawn_at: row.drawn_at.clone(),
            primary: row
                .primary
                .map(|v| case.panel.primary_to_canonical(&case.units, v)),
            companion: row
                .companion
                .map(|v| case.panel.companion_to_canonical(&case.units, v)),
        })
        .collect();
    SiteSampleSet::new(site, phase, samples, limits)
}
