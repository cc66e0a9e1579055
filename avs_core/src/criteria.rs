//! Built-in decision criteria for the interpretation engine.
//!
//! Thresholds and the rules they belong to are data, not constants in
//! the classifier, so they are inspectable and testable on their own.
//! Each rule carries its literature citation for the report's reference
//! block.

use crate::types::{Panel, ProtocolPhase, RuleCitation};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Phase-specific numeric thresholds
///
/// Comparison direction is fixed by the classifier: cannulation is
/// inclusive (`SI >= si_min`), lateralization bounds are strict
/// (`LI > li_unilateral`, `LI < li_bilateral`), suppression is strict
/// (`CSI < csi_max`), secretion is strict (`RASI > rasi_min`). Values
/// exactly on a lateralization bound land in the equivocal band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseCriteria {
    pub phase: ProtocolPhase,
    pub si_min: f64,
    pub li_unilateral: f64,
    pub li_bilateral: f64,
    pub csi_max: f64,
    pub rasi_min: f64,
}

/// A named decision rule with its citation
#[derive(Clone, Debug)]
pub struct DecisionRule {
    pub id: String,
    pub description: String,
    pub citation: String,
}

/// The complete criteria set for one hormone panel
#[derive(Clone, Debug)]
pub struct CriteriaCatalog {
    pub panel: Panel,
    pub pre: PhaseCriteria,
    pub post: PhaseCriteria,
    pub rules: HashMap<String, DecisionRule>,
}

/// Cached aldosterone-panel criteria, built once and shared
static ALDOSTERONE_CRITERIA: Lazy<CriteriaCatalog> =
    Lazy::new(|| build_criteria_catalog_internal(Panel::Aldosterone));

/// Cached cortisol-panel criteria, built once and shared
static CORTISOL_CRITERIA: Lazy<CriteriaCatalog> =
    Lazy::new(|| build_criteria_catalog_internal(Panel::Cortisol));

/// Get a reference to the cached criteria catalog for a panel
pub fn default_criteria(panel: Panel) -> &'static CriteriaCatalog {
    match panel {
        Panel::Aldosterone => &ALDOSTERONE_CRITERIA,
        Panel::Cortisol => &CORTISOL_CRITERIA,
    }
}

/// Build a fresh criteria catalog
///
/// **Note**: prefer `default_criteria()` which returns a cached
/// reference. This function is retained for testing and custom catalog
/// construction.
pub fn build_criteria_catalog(panel: Panel) -> CriteriaCatalog {
    build_criteria_catalog_internal(panel)
}

fn build_criteria_catalog_internal(panel: Panel) -> CriteriaCatalog {
    let mut rules = HashMap::new();

    let rule = |rules: &mut HashMap<String, DecisionRule>, id: &str, desc: &str, cite: &str| {
        rules.insert(
            id.to_string(),
            DecisionRule {
                id: id.to_string(),
                description: desc.to_string(),
                citation: cite.to_string(),
            },
        );
    };

    // Citations are shared between panels where the threshold carries
    // over; the cortisol panel reuses the aldosterone cutoffs pending a
    // panel-specific consensus.
    let young_2004 = "Young WF, Stanson AW, Thompson GB, et al. Role for adrenal venous \
                      sampling in primary aldosteronism. Surgery 2004;136:1227-1235.";
    let funder_2016 = "Funder JW, Carey RM, Mantero F, et al. The management of primary \
                       aldosteronism: case detection, diagnosis, and treatment. J Clin \
                       Endocrinol Metab 2016;101:1889-1916.";
    let rossi_2014 = "Rossi GP, Auchus RJ, Brown M, et al. An expert consensus statement on \
                      use of adrenal vein sampling for the subtyping of primary \
                      aldosteronism. Hypertension 2014;63:151-160.";
    let wolley_2015 = "Wolley MJ, Gordon RD, Ahmed AH, Stowasser M. Does contralateral \
                       suppression at adrenal venous sampling predict outcome following \
                       unilateral adrenalectomy for primary aldosteronism? J Clin \
                       Endocrinol Metab 2015;100:1477-1484.";
    let pasternak_2016 = "Pasternak JD, Epelboym I, Seiser N, et al. Diagnostic utility of \
                          data from adrenal venous sampling for primary aldosteronism \
                          despite failed cannulation of the right adrenal vein. Surgery \
                          2016;159:267-273.";
    let young_2008 = "Young WF, du Plessis H, Thompson GB, et al. The clinical conundrum \
                      of corticotropin-independent autonomous cortisol secretion in \
                      patients with bilateral adrenal masses. World J Surg \
                      2008;32:856-862.";

    let (marker, panel_cite) = match panel {
        Panel::Aldosterone => ("cortisol", funder_2016),
        Panel::Cortisol => ("epinephrine", young_2008),
    };

    rule(
        &mut rules,
        "si_pre",
        &format!(
            "Selectivity index ({marker} vein/IVC) >= 2 without stimulation confirms \
             cannulation"
        ),
        young_2004,
    );
    rule(
        &mut rules,
        "si_post",
        &format!(
            "Selectivity index ({marker} vein/IVC) >= 5 under cosyntropin stimulation \
             confirms cannulation"
        ),
        young_2004,
    );
    rule(
        &mut rules,
        "li_uni_pre",
        "Lateralization index > 2 without stimulation indicates unilateral disease",
        panel_cite,
    );
    rule(
        &mut rules,
        "li_uni_post",
        "Lateralization index > 4 under cosyntropin stimulation indicates unilateral disease",
        panel_cite,
    );
    rule(
        &mut rules,
        "li_bi_pre",
        "Lateralization index < 1.5 without stimulation indicates bilateral disease",
        rossi_2014,
    );
    rule(
        &mut rules,
        "li_bi_post",
        "Lateralization index < 3 under cosyntropin stimulation indicates bilateral disease",
        rossi_2014,
    );
    rule(
        &mut rules,
        "csi",
        "Contralateral suppression index < 1 corroborates unilateral disease on the \
         opposite side",
        wolley_2015,
    );
    rule(
        &mut rules,
        "rasi",
        "Adrenal-vein/IVC secretion ratio > 2.5 without stimulation or > 5.5 under \
         stimulation corroborates dominant-side hypersecretion",
        pasternak_2016,
    );

    CriteriaCatalog {
        panel,
        pre: PhaseCriteria {
            phase: ProtocolPhase::Pre,
            si_min: 2.0,
            li_unilateral: 2.0,
            li_bilateral: 1.5,
            csi_max: 1.0,
            rasi_min: 2.5,
        },
        post: PhaseCriteria {
            phase: ProtocolPhase::Post,
            si_min: 5.0,
            li_unilateral: 4.0,
            li_bilateral: 3.0,
            csi_max: 1.0,
            rasi_min: 5.5,
        },
        rules,
    }
}

impl CriteriaCatalog {
    pub fn for_phase(&self, phase: ProtocolPhase) -> &PhaseCriteria {
        match phase {
            ProtocolPhase::Pre => &self.pre,
            ProtocolPhase::Post => &self.post,
        }
    }

    pub fn rule(&self, id: &str) -> Option<&DecisionRule> {
        self.rules.get(id)
    }

    /// Citation entry for a rule id; unknown ids cite themselves so a
    /// catalog gap never drops an audit entry
    pub fn cite(&self, id: &str) -> RuleCitation {
        RuleCitation {
            rule_id: id.to_string(),
            citation: self
                .rules
                .get(id)
                .map(|r| r.citation.clone())
                .unwrap_or_else(|| id.to_string()),
        }
    }

    /// Unique citation strings in rule-id order
    pub fn references(&self) -> Vec<String> {
        let mut ids: Vec<&String> = self.rules.keys().collect();
        ids.sort();
        let mut refs: Vec<String> = Vec::new();
        for id in ids {
            if let Some(rule) = self.rules.get(id) {
                if !refs.contains(&rule.citation) {
                    refs.push(rule.citation.clone());
                }
            }
        }
        refs
    }

    /// One-paragraph description of the thresholds in force, for the
    /// report's methodology block
    pub fn methodology_note(&self) -> String {
        format!(
            "AVS interpretation ({} panel). Cannulation: SI >= {} (unstimulated) / {} \
             (cosyntropin). Lateralization: LI > {} / {} unilateral, LI < {} / {} \
             bilateral, intermediate values equivocal. Corroboration: CSI < {} or \
             AV/IVC ratio > {} / {}. Samples per site are averaged per analyte before \
             any ratio is taken.",
            self.panel,
            self.pre.si_min,
            self.post.si_min,
            self.pre.li_unilateral,
            self.post.li_unilateral,
            self.pre.li_bilateral,
            self.post.li_bilateral,
            self.pre.csi_max,
            self.pre.rasi_min,
            self.post.rasi_min,
        )
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, rule) in &self.rules {
            if id.is_empty() || rule.id.is_empty() {
                errors.push("Rule has empty ID".to_string());
            }
            if id != &rule.id {
                errors.push(format!("Rule key '{}' doesn't match rule.id '{}'", id, rule.id));
            }
            if rule.description.is_empty() {
                errors.push(format!("Rule '{}' has empty description", id));
            }
            if rule.citation.is_empty() {
                errors.push(format!("Rule '{}' has empty citation", id));
            }
        }

        for criteria in [&self.pre, &self.post] {
            let phase = criteria.phase;
            if criteria.si_min <= 0.0 {
                errors.push(format!("{phase}: selectivity threshold must be positive"));
            }
            // LI is max/min and never below 1, so the bilateral bound
            // must sit in (1, unilateral) for the bands to be disjoint
            if criteria.li_bilateral <= 1.0 {
                errors.push(format!("{phase}: bilateral LI bound must exceed 1"));
            }
            if criteria.li_bilateral >= criteria.li_unilateral {
                errors.push(format!(
                    "{phase}: bilateral LI bound {} must be below the unilateral bound {}",
                    criteria.li_bilateral, criteria.li_unilateral
                ));
            }
            if criteria.csi_max <= 0.0 {
                errors.push(format!("{phase}: suppression threshold must be positive"));
            }
            if criteria.rasi_min <= 0.0 {
                errors.push(format!("{phase}: secretion threshold must be positive"));
            }
        }

        if self.pre.phase != ProtocolPhase::Pre || self.post.phase != ProtocolPhase::Post {
            errors.push("Phase criteria are assigned to the wrong phases".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogs_validate() {
        for panel in [Panel::Aldosterone, Panel::Cortisol] {
            let errors = default_criteria(panel).validate();
            assert!(errors.is_empty(), "{panel} catalog invalid: {errors:?}");
        }
    }

    #[test]
    fn test_aldosterone_thresholds() {
        let catalog = default_criteria(Panel::Aldosterone);
        assert_eq!(catalog.pre.si_min, 2.0);
        assert_eq!(catalog.post.si_min, 5.0);
        assert_eq!(catalog.pre.li_unilateral, 2.0);
        assert_eq!(catalog.post.li_unilateral, 4.0);
        assert_eq!(catalog.pre.li_bilateral, 1.5);
        assert_eq!(catalog.post.li_bilateral, 3.0);
        assert_eq!(catalog.post.csi_max, 1.0);
        assert_eq!(catalog.post.rasi_min, 5.5);
    }

    #[test]
    fn test_for_phase_selects_matching_criteria() {
        let catalog = default_criteria(Panel::Aldosterone);
        assert_eq!(catalog.for_phase(ProtocolPhase::Pre).phase, ProtocolPhase::Pre);
        assert_eq!(
            catalog.for_phase(ProtocolPhase::Post).phase,
            ProtocolPhase::Post
        );
    }

    #[test]
    fn test_every_rule_id_cites_its_rule() {
        let catalog = default_criteria(Panel::Aldosterone);
        for id in catalog.rules.keys() {
            let citation = catalog.cite(id);
            assert_eq!(citation.rule_id, *id);
            assert!(!citation.citation.is_empty());
            assert_ne!(citation.citation, *id);
        }
    }

    #[test]
    fn test_unknown_rule_id_still_yields_an_entry() {
        let catalog = default_criteria(Panel::Aldosterone);
        let citation = catalog.cite("not_a_rule");
        assert_eq!(citation.rule_id, "not_a_rule");
        assert_eq!(citation.citation, "not_a_rule");
    }

    #[test]
    fn test_references_are_deduplicated_and_stable() {
        let catalog = default_criteria(Panel::Aldosterone);
        let refs = catalog.references();
        // si_pre and si_post share one citation
        let unique: std::collections::HashSet<&String> = refs.iter().collect();
        assert_eq!(unique.len(), refs.len());
        assert_eq!(refs, catalog.references());
        assert!(refs.iter().any(|r| r.contains("Surgery 2004")));
    }

    #[test]
    fn test_methodology_note_names_the_thresholds() {
        let note = default_criteria(Panel::Aldosterone).methodology_note();
        assert!(note.contains("SI >= 2"));
        assert!(note.contains("LI > 2"));
        assert!(note.contains("> 5.5"));
    }

    #[test]
    fn test_cortisol_panel_uses_epinephrine_marker() {
        let catalog = default_criteria(Panel::Cortisol);
        let rule = catalog.rule("si_post").unwrap();
        assert!(rule.description.contains("epinephrine"));
    }
}
