#![forbid(unsafe_code)]

//! Core domain model and interpretation logic for adrenal vein sampling.
//!
//! This crate provides:
//! - Domain types (sites, phases, panels, samples, conclusions)
//! - Unit conversion for the two convertible analyte families
//! - Per-site sample aggregation under asymmetric caps
//! - Diagnostic index derivation and the classification engine
//! - Plausibility advisories
//! - CSV report rendering and re-parsing

pub mod types;
pub mod error;
pub mod units;
pub mod aggregate;
pub mod ratios;
pub mod criteria;
pub mod classify;
pub mod warnings;
pub mod evaluate;
pub mod summary;
pub mod report;
pub mod case;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use aggregate::{aggregate, SampleLimits};
pub use case::{load_case, template, TemplateFormat};
pub use classify::classify;
pub use config::Config;
pub use criteria::{build_criteria_catalog, default_criteria, CriteriaCatalog};
pub use evaluate::{evaluate_case, evaluate_phase};
pub use ratios::compute_ratios;
pub use report::{parse_report, render_report, report_filename, ParsedReport};
pub use summary::{error_rows, result_rows, DisplayRow};
pub use units::{AldosteroneUnit, AnalyteFamily, CortisolUnit, UnitSelection};
pub use warnings::detect_warnings;
