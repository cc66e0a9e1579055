//! CSV report artifact.
//!
//! Serializes one evaluation into a flat comma-separated artifact:
//! metadata, raw per-sample inputs with draw times, derived indices,
//! the conclusion with its citations, and the methodology and reference
//! blocks. One data row per evaluated phase. Raw values are written in
//! their shortest round-trip form, so re-parsing the artifact recovers
//! them bit for bit. The exporter returns text; where it lands is the
//! caller's business.

use crate::aggregate::SampleLimits;
use crate::criteria::default_criteria;
use crate::error::{Error, Result};
use crate::types::{
    CaseEvaluation, CaseMeta, PhaseEvaluation, PhaseInput, ProtocolPhase, SampleRow, Site,
};
use chrono::Utc;
use std::io;

const SITES: [Site; 3] = [Site::Left, Site::Right, Site::Ivc];

const META_COLUMNS: [&str; 10] = [
    "report_id",
    "generated_at",
    "exam_date",
    "initials",
    "nodule_side",
    "notes",
    "panel",
    "primary_unit",
    "companion_unit",
    "phase",
];

const RATIO_COLUMNS: [&str; 12] = [
    "si_left",
    "si_right",
    "ac_left",
    "ac_right",
    "ac_ivc",
    "li",
    "cr",
    "csi",
    "rasi",
    "avivc_left",
    "avivc_right",
    "dominant",
];

const TRAILING_COLUMNS: [&str; 6] = [
    "conclusion",
    "citations",
    "caveats",
    "warnings",
    "methodology",
    "references",
];

// ============================================================================
// Rendering
// ============================================================================

/// Render an evaluation as CSV text
pub fn render_report(evaluation: &CaseEvaluation) -> Result<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer.write_record(header_columns(&evaluation.limits))?;
    for phase in &evaluation.phases {
        writer.write_record(phase_record(evaluation, phase))?;
    }

    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    tracing::info!(
        "Rendered report {} ({} phase row(s))",
        evaluation.id,
        evaluation.phases.len()
    );

    Ok(text)
}

fn header_columns(limits: &SampleLimits) -> Vec<String> {
    let mut columns: Vec<String> = META_COLUMNS.iter().map(|c| c.to_string()).collect();
    for site in SITES {
        for n in 1..=limits.for_site(site) {
            columns.push(format!("{}_s{n}_primary", site.key()));
            columns.push(format!("{}_s{n}_companion", site.key()));
            columns.push(format!("{}_s{n}_time", site.key()));
        }
    }
    columns.extend(RATIO_COLUMNS.iter().map(|c| c.to_string()));
    columns.extend(TRAILING_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

fn phase_record(evaluation: &CaseEvaluation, phase: &PhaseEvaluation) -> Vec<String> {
    let case = &evaluation.case;
    let meta = &case.meta;
    let catalog = default_criteria(case.panel);

    let mut record = vec![
        evaluation.id.to_string(),
        evaluation.generated_at.to_rfc3339(),
        meta.exam_date.map(|d| d.to_string()).unwrap_or_default(),
        meta.initials.clone().unwrap_or_default(),
        meta.nodule_side.map(|s| s.to_string()).unwrap_or_default(),
        meta.notes.clone().unwrap_or_default(),
        case.panel.to_string(),
        case.panel.primary_unit_label(&case.units).to_string(),
        case.panel.companion_unit_label(&case.units).to_string(),
        phase.phase.to_string(),
    ];

    let empty = PhaseInput::default();
    let input = case.phase_input(phase.phase).unwrap_or(&empty);
    for site in SITES {
        push_site_cells(&mut record, input, site, evaluation.limits.for_site(site));
    }

    let r = &phase.ratios;
    for value in [
        r.si_left,
        r.si_right,
        r.ac_left,
        r.ac_right,
        r.ac_ivc,
        r.li,
        r.cr,
        r.csi,
        r.rasi,
        r.avivc_left,
        r.avivc_right,
    ] {
        record.push(value.to_string());
    }
    record.push(r.dominant.to_string());

    record.push(phase.classification.conclusion.to_string());
    record.push(
        phase
            .classification
            .citations
            .iter()
            .map(|c| format!("{}: {}", c.rule_id, c.citation))
            .collect::<Vec<_>>()
            .join(" | "),
    );
    record.push(phase.classification.caveats.join(" | "));
    record.push(
        phase
            .warnings
            .iter()
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect::<Vec<_>>()
            .join(" | "),
    );
    record.push(catalog.methodology_note());
    record.push(catalog.references().join(" | "));

    record
}

/// Non-blank rows for one site, padded with empty cells up to the cap
fn push_site_cells(record: &mut Vec<String>, input: &PhaseInput, site: Site, limit: usize) {
    let rows: Vec<&SampleRow> = input
        .rows(site)
        .iter()
        .filter(|row| row.primary.is_some() || row.companion.is_some())
        .collect();
    for n in 0..limit {
        match rows.get(n) {
            Some(row) => {
                record.push(row.primary.map(|v| v.to_string()).unwrap_or_default());
                record.push(row.companion.map(|v| v.to_string()).unwrap_or_default());
                record.push(row.drawn_at.clone().unwrap_or_default());
            }
            None => {
                record.push(String::new());
                record.push(String::new());
                record.push(String::new());
            }
        }
    }
}

// ============================================================================
// Re-parsing
// ============================================================================

/// A report read back from its CSV text
#[derive(Clone, Debug)]
pub struct ParsedReport {
    pub report_id: String,
    pub panel: String,
    pub initials: Option<String>,
    pub notes: Option<String>,
    pub phases: Vec<ParsedPhase>,
}

/// One phase row recovered from a report
#[derive(Clone, Debug)]
pub struct ParsedPhase {
    pub phase: ProtocolPhase,
    pub input: PhaseInput,
    pub conclusion: String,
}

/// Parse report text back into its raw per-sample inputs
///
/// The sample columns are discovered from the header, so reports
/// written under different sample caps read back without
/// reconfiguration.
pub fn parse_report(text: &str) -> Result<ParsedReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| {
        column(name).ok_or_else(|| Error::Report(format!("missing column '{name}'")))
    };

    let id_col = required("report_id")?;
    let panel_col = required("panel")?;
    let phase_col = required("phase")?;
    let conclusion_col = required("conclusion")?;
    let initials_col = column("initials");
    let notes_col = column("notes");

    let mut report: Option<ParsedReport> = None;

    for record in reader.records() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or_default();

        let phase: ProtocolPhase = field(phase_col)
            .parse()
            .map_err(|_| Error::Report(format!("invalid phase '{}'", field(phase_col))))?;

        let mut input = PhaseInput::default();
        for site in SITES {
            *site_rows_mut(&mut input, site) = parse_site_rows(&headers, &record, site)?;
        }

        let parsed_phase = ParsedPhase {
            phase,
            input,
            conclusion: field(conclusion_col).to_string(),
        };

        match report.as_mut() {
            Some(report) => report.phases.push(parsed_phase),
            None => {
                report = Some(ParsedReport {
                    report_id: field(id_col).to_string(),
                    panel: field(panel_col).to_string(),
                    initials: initials_col.map(field).filter(|s| !s.is_empty()).map(String::from),
                    notes: notes_col.map(field).filter(|s| !s.is_empty()).map(String::from),
                    phases: vec![parsed_phase],
                });
            }
        }
    }

    report.ok_or_else(|| Error::Report("report has no data rows".to_string()))
}

fn site_rows_mut(input: &mut PhaseInput, site: Site) -> &mut Vec<SampleRow> {
    match site {
        Site::Left => &mut input.left,
        Site::Right => &mut input.right,
        Site::Ivc => &mut input.ivc,
    }
}

fn parse_site_rows(
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
    site: Site,
) -> Result<Vec<SampleRow>> {
    let mut rows = Vec::new();
    let mut n = 1;
    loop {
        let primary_col = format!("{}_s{n}_primary", site.key());
        let primary_index = match headers.iter().position(|h| h == primary_col) {
            Some(index) => index,
            None => break,
        };
        let companion_index = headers
            .iter()
            .position(|h| h == format!("{}_s{n}_companion", site.key()));
        let time_index = headers
            .iter()
            .position(|h| h == format!("{}_s{n}_time", site.key()));

        let cell = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let primary = parse_value(cell(Some(primary_index)), site, "primary")?;
        let companion = parse_value(cell(companion_index), site, "companion")?;
        let drawn_at = cell(time_index);

        if primary.is_some() || companion.is_some() || drawn_at.is_some() {
            rows.push(SampleRow {
                primary,
                companion,
                drawn_at,
            });
        }
        n += 1;
    }
    Ok(rows)
}

fn parse_value(cell: Option<String>, site: Site, analyte: &str) -> Result<Option<f64>> {
    match cell {
        None => Ok(None),
        Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
            Error::Report(format!(
                "unparseable {analyte} value '{text}' at the {site} site"
            ))
        }),
    }
}

// ============================================================================
// Filename
// ============================================================================

/// Conventional filename for a report: initials and a date fragment
///
/// Falls back to "anon" without initials and to today's date without an
/// exam date.
pub fn report_filename(meta: &CaseMeta) -> String {
    let initials: String = meta
        .initials
        .as_deref()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let initials = if initials.is_empty() {
        "anon".to_string()
    } else {
        initials
    };
    let date = meta
        .exam_date
        .unwrap_or_else(|| Utc::now().date_naive())
        .format("%Y%m%d");
    format!("avs_{initials}_{date}.csv")
}
