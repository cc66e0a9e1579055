//! Ordered display rows for presentation layers.
//!
//! The engine's consumers render a flat key/value listing; section
//! breaks are pseudo-entries with a key and an empty value, and a fatal
//! failure renders as a single `Error` pseudo-entry in place of the
//! result rows.

use crate::criteria::default_criteria;
use crate::error::Error;
use crate::types::{CaseEvaluation, PhaseEvaluation};

/// One display entry; `value` is empty for section headers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayRow {
    pub key: String,
    pub value: String,
}

impl DisplayRow {
    pub fn header(key: impl Into<String>) -> Self {
        DisplayRow {
            key: key.into(),
            value: String::new(),
        }
    }

    pub fn entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        DisplayRow {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn is_header(&self) -> bool {
        self.value.is_empty()
    }
}

/// Render a complete evaluation as ordered display rows
pub fn result_rows(evaluation: &CaseEvaluation) -> Vec<DisplayRow> {
    let mut rows = Vec::new();
    let case = &evaluation.case;

    rows.push(DisplayRow::header("Case"));
    rows.push(DisplayRow::entry("Panel", case.panel.to_string()));
    rows.push(DisplayRow::entry(
        "Units",
        format!(
            "{} / {}",
            case.panel.primary_unit_label(&case.units),
            case.panel.companion_unit_label(&case.units)
        ),
    ));
    if let Some(initials) = &case.meta.initials {
        rows.push(DisplayRow::entry("Patient", initials.clone()));
    }
    if let Some(date) = case.meta.exam_date {
        rows.push(DisplayRow::entry("Exam date", date.to_string()));
    }
    if let Some(side) = case.meta.nodule_side {
        rows.push(DisplayRow::entry("Known nodule", side.to_string()));
    }
    if let Some(notes) = &case.meta.notes {
        rows.push(DisplayRow::entry("Notes", notes.clone()));
    }
    rows.push(DisplayRow::entry("Report id", evaluation.id.to_string()));

    for phase in &evaluation.phases {
        push_phase_rows(&mut rows, phase);
    }

    let catalog = default_criteria(case.panel);
    rows.push(DisplayRow::header("Methodology"));
    rows.push(DisplayRow::entry("Note", catalog.methodology_note()));
    rows.push(DisplayRow::header("References"));
    for reference in catalog.references() {
        rows.push(DisplayRow::entry("Reference", reference));
    }

    rows
}

fn push_phase_rows(rows: &mut Vec<DisplayRow>, phase: &PhaseEvaluation) {
    rows.push(DisplayRow::header(format!("{} phase", capitalize(phase.phase))));

    let r = &phase.ratios;
    rows.push(DisplayRow::entry("Selectivity index (left)", num(r.si_left)));
    rows.push(DisplayRow::entry("Selectivity index (right)", num(r.si_right)));
    rows.push(DisplayRow::entry("A/C (left)", num(r.ac_left)));
    rows.push(DisplayRow::entry("A/C (right)", num(r.ac_right)));
    rows.push(DisplayRow::entry("A/C (IVC)", num(r.ac_ivc)));
    rows.push(DisplayRow::entry("Lateralization index", num(r.li)));
    rows.push(DisplayRow::entry("Contralateral suppression index", num(r.csi)));
    rows.push(DisplayRow::entry("RASI", num(r.rasi)));
    rows.push(DisplayRow::entry("AV/IVC (left)", num(r.avivc_left)));
    rows.push(DisplayRow::entry("AV/IVC (right)", num(r.avivc_right)));

    rows.push(DisplayRow::entry(
        "Conclusion",
        phase.classification.conclusion.to_string(),
    ));
    for caveat in &phase.classification.caveats {
        rows.push(DisplayRow::entry("Note", caveat.clone()));
    }
    for citation in &phase.classification.citations {
        rows.push(DisplayRow::entry(
            "Rule applied",
            format!("{}: {}", citation.rule_id, citation.citation),
        ));
    }

    if !phase.warnings.is_empty() {
        rows.push(DisplayRow::header("Warnings"));
        for warning in &phase.warnings {
            rows.push(DisplayRow::entry(warning.field.clone(), warning.message.clone()));
        }
    }
}

/// Render a fatal error as the sole output row
pub fn error_rows(error: &Error) -> Vec<DisplayRow> {
    vec![DisplayRow::entry("Error", error.to_string())]
}

fn num(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        value.to_string()
    }
}

fn capitalize(phase: crate::types::ProtocolPhase) -> String {
    let s = phase.to_string();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => s,
    }
}
