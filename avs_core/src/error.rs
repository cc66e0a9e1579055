//! Error types for the avs_core library.

use crate::types::{ProtocolPhase, Site};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for avs_core operations
///
/// Fatal conditions stop the evaluation pipeline and become the sole
/// output of a "Calculate" invocation. Advisory conditions never appear
/// here; they travel as [`crate::types::Warning`] values next to the
/// conclusion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Unit tag not recognized by the converter
    #[error("unrecognized unit tag '{0}'")]
    UnitConversion(String),

    /// A required site has no sample with both analyte values present
    #[error("no valid sample for the {site} site in the {phase} phase")]
    MissingData { site: Site, phase: ProtocolPhase },

    /// More samples supplied for a site than its protocol allows
    #[error("{given} samples supplied for the {site} site, limit is {limit}")]
    SampleLimit {
        site: Site,
        given: usize,
        limit: usize,
    },

    /// Case file shape or content error
    #[error("case input error: {0}")]
    Case(String),

    /// Report artifact shape or content error
    #[error("report error: {0}")]
    Report(String),

    /// Configuration validation error
    #[error("configuration error: {0}")]
    Config(String),

    /// Criteria catalog validation error
    #[error("criteria catalog error: {0}")]
    Criteria(String),
}
