//! Physiological plausibility checks.
//!
//! Scans raw canonical-unit sample values and derived indices for
//! magnitudes outside fixed plausibility bands. Findings are always
//! advisory; they ride alongside the conclusion and never replace it.

use crate::types::{DerivedRatios, Panel, Site, SiteSampleSet, Warning};
use crate::units::AnalyteFamily;

/// Upper plausibility bounds for one analyte family, in canonical units
///
/// Adrenal-vein effluent runs orders of magnitude above peripheral
/// blood, so each family carries a reference-vessel bound and a much
/// higher adrenal-vein bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlausibilityBand {
    pub family: AnalyteFamily,
    pub reference_max: f64,
    pub adrenal_max: f64,
}

/// The fixed band for an analyte family
pub fn band(family: AnalyteFamily) -> PlausibilityBand {
    match family {
        AnalyteFamily::Aldosterone => PlausibilityBand {
            family,
            reference_max: 150.0,
            adrenal_max: 20_000.0,
        },
        AnalyteFamily::Cortisol => PlausibilityBand {
            family,
            reference_max: 100.0,
            adrenal_max: 5_000.0,
        },
        AnalyteFamily::Epinephrine => PlausibilityBand {
            family,
            reference_max: 2_000.0,
            adrenal_max: 1_000_000.0,
        },
    }
}

impl PlausibilityBand {
    fn max_for(&self, site: Site) -> f64 {
        match site {
            Site::Left | Site::Right => self.adrenal_max,
            Site::Ivc => self.reference_max,
        }
    }
}

/// Scan raw samples and derived indices for implausible values
///
/// Warnings are emitted in insertion order: the given sets in order,
/// samples in entry order, primary before companion, then the derived
/// indices in a fixed order. The output never influences the verdict.
pub fn detect_warnings(
    panel: Panel,
    sets: &[&SiteSampleSet],
    ratios: &DerivedRatios,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let primary_band = band(panel.primary_family());
    let companion_band = band(panel.companion_family());

    for set in sets {
        for (index, sample) in set.samples.iter().enumerate() {
            let row = index + 1;
            if let Some(value) = sample.primary {
                check_value(
                    &mut warnings,
                    format!("{}.{}.sample{row}.primary", set.phase, set.site.key()),
                    set.site,
                    value,
                    &primary_band,
                );
            }
            if let Some(value) = sample.companion {
                check_value(
                    &mut warnings,
                    format!("{}.{}.sample{row}.companion", set.phase, set.site.key()),
                    set.site,
                    value,
                    &companion_band,
                );
            }
        }
    }

    check_derived(&mut warnings, ratios);

    warnings
}

fn check_value(
    warnings: &mut Vec<Warning>,
    field: String,
    site: Site,
    value: f64,
    band: &PlausibilityBand,
) {
    let unit = band.family.canonical_label();
    if value < 0.0 {
        warnings.push(Warning::advisory(
            field,
            format!("Negative {} value {value} {unit}.", band.family),
        ));
        return;
    }
    let max = band.max_for(site);
    if value > max {
        let vessel = match site {
            Site::Ivc => "reference-vessel",
            _ => "adrenal-vein",
        };
        warnings.push(Warning::advisory(
            field,
            format!(
                "{} {value} {unit} at the {site} site exceeds the plausible \
                 {vessel} bound of {max} {unit}; check units and transcription.",
                band.family
            ),
        ));
    }
}

fn check_derived(warnings: &mut Vec<Warning>, ratios: &DerivedRatios) {
    let fields = [
        ("si_left", ratios.si_left),
        ("si_right", ratios.si_right),
        ("ac_left", ratios.ac_left),
        ("ac_right", ratios.ac_right),
        ("ac_ivc", ratios.ac_ivc),
        ("li", ratios.li),
        ("cr", ratios.cr),
        ("csi", ratios.csi),
        ("rasi", ratios.rasi),
        ("avivc_left", ratios.avivc_left),
        ("avivc_right", ratios.avivc_right),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            warnings.push(Warning::advisory(
                format!("{}.{name}", ratios.phase),
                format!(
                    "Derived index {name} is {value}; a zero denominator upstream \
                     makes this index uninterpretable."
                ),
            ));
        }
    }
}
