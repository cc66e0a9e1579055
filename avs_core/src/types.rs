//! Core domain types for the AVS interpretation engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Vascular sites, adrenal sides, and protocol phases
//! - Raw sample rows and per-site aggregates
//! - Derived diagnostic indices
//! - Conclusions, rule citations, and advisory warnings
//! - Case input and the per-invocation evaluation bundle

use crate::aggregate::SampleLimits;
use crate::units::UnitSelection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Anatomy and Protocol Types
// ============================================================================

/// A vascular sampling site
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Left,
    Right,
    Ivc,
}

impl Site {
    /// Lowercase key used for column names and log fields
    pub fn key(&self) -> &'static str {
        match self {
            Site::Left => "left",
            Site::Right => "right",
            Site::Ivc => "ivc",
        }
    }

    /// The adrenal side this site belongs to (`None` for the IVC)
    pub fn side(&self) -> Option<Side> {
        match self {
            Site::Left => Some(Side::Left),
            Site::Right => Some(Side::Right),
            Site::Ivc => None,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Left => f.write_str("left"),
            Site::Right => f.write_str("right"),
            Site::Ivc => f.write_str("IVC"),
        }
    }
}

/// One of the two adrenal sides
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn site(&self) -> Site {
        match self {
            Side::Left => Site::Left,
            Side::Right => Site::Right,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Whether a stimulating agent was administered before sampling
///
/// The phase decides which cannulation and lateralization thresholds
/// apply; post-stimulation thresholds are uniformly higher.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolPhase {
    Pre,
    Post,
}

impl fmt::Display for ProtocolPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolPhase::Pre => f.write_str("pre"),
            ProtocolPhase::Post => f.write_str("post"),
        }
    }
}

impl std::str::FromStr for ProtocolPhase {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pre" => Ok(ProtocolPhase::Pre),
            "post" => Ok(ProtocolPhase::Post),
            other => Err(crate::error::Error::Case(format!(
                "unrecognized phase '{other}' (expected pre or post)"
            ))),
        }
    }
}

/// Which phases a case asks to have evaluated
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSelection {
    Pre,
    Post,
    Both,
}

impl PhaseSelection {
    /// The phases to evaluate, in protocol order
    pub fn phases(&self) -> Vec<ProtocolPhase> {
        match self {
            PhaseSelection::Pre => vec![ProtocolPhase::Pre],
            PhaseSelection::Post => vec![ProtocolPhase::Post],
            PhaseSelection::Both => vec![ProtocolPhase::Pre, ProtocolPhase::Post],
        }
    }
}

impl std::str::FromStr for PhaseSelection {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pre" => Ok(PhaseSelection::Pre),
            "post" => Ok(PhaseSelection::Post),
            "both" => Ok(PhaseSelection::Both),
            other => Err(crate::error::Error::Case(format!(
                "unrecognized phase selection '{other}' (expected pre, post, or both)"
            ))),
        }
    }
}

/// The hormone panel under interpretation
///
/// Each panel pairs a primary analyte (the hormone whose source is being
/// localized) with a companion analyte used as the catheterization
/// marker: cortisol for the aldosterone panel, epinephrine for the
/// cortisol panel.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Aldosterone,
    Cortisol,
}

impl Panel {
    pub fn primary_family(&self) -> crate::units::AnalyteFamily {
        match self {
            Panel::Aldosterone => crate::units::AnalyteFamily::Aldosterone,
            Panel::Cortisol => crate::units::AnalyteFamily::Cortisol,
        }
    }

    pub fn companion_family(&self) -> crate::units::AnalyteFamily {
        match self {
            Panel::Aldosterone => crate::units::AnalyteFamily::Cortisol,
            Panel::Cortisol => crate::units::AnalyteFamily::Epinephrine,
        }
    }

    /// Printed unit tag for the primary analyte under this selection
    pub fn primary_unit_label(&self, units: &UnitSelection) -> &'static str {
        match self {
            Panel::Aldosterone => units.aldosterone.label(),
            Panel::Cortisol => units.cortisol.label(),
        }
    }

    /// Printed unit tag for the companion analyte under this selection
    pub fn companion_unit_label(&self, units: &UnitSelection) -> &'static str {
        match self {
            Panel::Aldosterone => units.cortisol.label(),
            Panel::Cortisol => crate::units::EPINEPHRINE_LABEL,
        }
    }

    /// Convert a primary-analyte value from the selected unit to canonical
    pub fn primary_to_canonical(&self, units: &UnitSelection, value: f64) -> f64 {
        match self {
            Panel::Aldosterone => units.aldosterone.to_canonical(value),
            Panel::Cortisol => units.cortisol.to_canonical(value),
        }
    }

    /// Convert a companion-analyte value from the selected unit to canonical
    pub fn companion_to_canonical(&self, units: &UnitSelection, value: f64) -> f64 {
        match self {
            Panel::Aldosterone => units.cortisol.to_canonical(value),
            // epinephrine is reported in pg/mL only
            Panel::Cortisol => value,
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Panel::Aldosterone => f.write_str("aldosterone"),
            Panel::Cortisol => f.write_str("cortisol"),
        }
    }
}

// ============================================================================
// Sample and Aggregate Types
// ============================================================================

/// One raw sample row as entered, in the case's selected units
///
/// Either analyte may be absent at a given draw; aggregation skips the
/// missing value rather than defaulting it to zero.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SampleRow {
    #[serde(default)]
    pub primary: Option<f64>,
    #[serde(default)]
    pub companion: Option<f64>,
    #[serde(default)]
    pub drawn_at: Option<String>,
}

/// A unit-normalized sample for one site; immutable once constructed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub site: Site,
    pub drawn_at: Option<String>,
    /// Primary analyte in canonical units
    pub primary: Option<f64>,
    /// Companion analyte in canonical units
    pub companion: Option<f64>,
}

impl Sample {
    /// A complete sample carries both analyte values
    pub fn is_complete(&self) -> bool {
        self.primary.is_some() && self.companion.is_some()
    }

    /// A blank row carries neither value
    pub fn is_blank(&self) -> bool {
        self.primary.is_none() && self.companion.is_none()
    }
}

/// Ordered samples for one site within one protocol phase
///
/// Constructed through [`crate::aggregate::SiteSampleSet::new`], which
/// enforces the per-site sample cap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteSampleSet {
    pub site: Site,
    pub phase: ProtocolPhase,
    pub samples: Vec<Sample>,
}

/// Per-site aggregate: independent arithmetic means of each analyte
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AggregatedSite {
    pub site: Site,
    pub mean_primary: f64,
    pub mean_companion: f64,
    /// Count of samples carrying both analyte values
    pub valid_sample_count: usize,
}

/// The reference-vessel aggregate, without a laterality
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IvcReference {
    pub mean_primary: f64,
    pub mean_companion: f64,
}

impl From<&AggregatedSite> for IvcReference {
    fn from(site: &AggregatedSite) -> Self {
        IvcReference {
            mean_primary: site.mean_primary,
            mean_companion: site.mean_companion,
        }
    }
}

// ============================================================================
// Derived Index Types
// ============================================================================

/// The full index set derived from one phase's aggregates
///
/// All values are plain quotients; a division by zero stays non-finite
/// here and is surfaced downstream as an advisory, never an error.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DerivedRatios {
    pub phase: ProtocolPhase,
    /// Selectivity index per side: companion_side / companion_ivc
    pub si_left: f64,
    pub si_right: f64,
    /// Primary/companion quotient per site
    pub ac_left: f64,
    pub ac_right: f64,
    pub ac_ivc: f64,
    /// Lateralization index: dominant-side AC over nondominant-side AC
    pub li: f64,
    /// Contralateral ratio: AC of the nondominant side over AC_IVC
    pub cr: f64,
    /// Contralateral-suppression index (numerically equal to CR, held
    /// separately because it is judged against its own threshold)
    pub csi: f64,
    /// Relative-secretion index: AC of the dominant side over AC_IVC
    pub rasi: f64,
    /// Per-side adrenal-vein-to-IVC ratio: AC_side / AC_IVC
    pub avivc_left: f64,
    pub avivc_right: f64,
    /// Side with the larger AC
    pub dominant: Side,
}

impl DerivedRatios {
    pub fn avivc(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.avivc_left,
            Side::Right => self.avivc_right,
        }
    }

    pub fn si(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.si_left,
            Side::Right => self.si_right,
        }
    }
}

// ============================================================================
// Conclusion and Classification Types
// ============================================================================

/// How strongly the evidence supports the verdict
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => f.write_str("high"),
            Confidence::Moderate => f.write_str("moderate"),
            Confidence::Low => f.write_str("low"),
        }
    }
}

/// Which end of the equivocal band the lateralization index sits nearer
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EquivocalLean {
    NearBilateral,
    NearUnilateral,
}

/// Both verdicts retained when independent rule sets disagree
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConflictDetails {
    pub primary: Box<Conclusion>,
    pub corroborating: Box<Conclusion>,
    pub summary: String,
}

/// Terminal classification outcome
///
/// `InsufficientData` is a displayable verdict ("cannot lateralize"),
/// distinct from the fatal errors in [`crate::error::Error`]. A
/// disagreement between independent rule sets is preserved as
/// `ConflictingCriteria` rather than resolved by a tie-break.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Conclusion {
    InsufficientData,
    CannulationFailed {
        side: Side,
    },
    Unilateral {
        side: Side,
        confidence: Confidence,
        /// Reached through cannulation-independent criteria
        rescue: bool,
    },
    Bilateral,
    Equivocal {
        lean: EquivocalLean,
    },
    ConflictingCriteria {
        details: ConflictDetails,
    },
}

impl Conclusion {
    /// A definite verdict asserts a laterality (unilateral or bilateral)
    pub fn is_definite(&self) -> bool {
        matches!(self, Conclusion::Unilateral { .. } | Conclusion::Bilateral)
    }

    /// The asserted side for unilateral verdicts
    pub fn unilateral_side(&self) -> Option<Side> {
        match self {
            Conclusion::Unilateral { side, .. } => Some(*side),
            _ => None,
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conclusion::InsufficientData => write!(f, "insufficient data to lateralize"),
            Conclusion::CannulationFailed { side } => {
                write!(f, "cannulation failed on the {side} side")
            }
            Conclusion::Unilateral {
                side,
                confidence,
                rescue,
            } => {
                if *rescue {
                    write!(f, "unilateral {side} (confidence {confidence}, rescue criteria)")
                } else {
                    write!(f, "unilateral {side} (confidence {confidence})")
                }
            }
            Conclusion::Bilateral => write!(f, "bilateral (no lateralization)"),
            Conclusion::Equivocal { lean } => match lean {
                EquivocalLean::NearBilateral => write!(f, "equivocal (nearer bilateral)"),
                EquivocalLean::NearUnilateral => write!(f, "equivocal (nearer unilateral)"),
            },
            Conclusion::ConflictingCriteria { details } => {
                write!(f, "conflicting criteria: {}", details.summary)
            }
        }
    }
}

/// A decision rule applied during classification, with its literature
/// citation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleCitation {
    pub rule_id: String,
    pub citation: String,
}

/// The engine's verdict plus its audit trail
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Classification {
    pub conclusion: Conclusion,
    /// Rules consulted on the path to the verdict, in application order
    pub citations: Vec<RuleCitation>,
    /// Interpretive notes attached to the verdict
    pub caveats: Vec<String>,
}

// ============================================================================
// Warning Types
// ============================================================================

/// Severity of a plausibility finding; advisories never block a result
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Advisory,
}

/// A non-fatal plausibility finding attached to an evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Warning {
    pub field: String,
    pub severity: Severity,
    pub message: String,
}

impl Warning {
    pub fn advisory(field: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            field: field.into(),
            severity: Severity::Advisory,
            message: message.into(),
        }
    }
}

// ============================================================================
// Case Input Types
// ============================================================================

/// Optional patient metadata carried into the report
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CaseMeta {
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    /// Laterality of a nodule already known from imaging, if any
    #[serde(default)]
    pub nodule_side: Option<Side>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Raw sample rows for one phase, keyed by site
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PhaseInput {
    #[serde(default)]
    pub left: Vec<SampleRow>,
    #[serde(default)]
    pub right: Vec<SampleRow>,
    #[serde(default)]
    pub ivc: Vec<SampleRow>,
}

impl PhaseInput {
    pub fn rows(&self, site: Site) -> &[SampleRow] {
        match site {
            Site::Left => &self.left,
            Site::Right => &self.right,
            Site::Ivc => &self.ivc,
        }
    }
}

/// One complete case as supplied by the caller
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseInput {
    pub panel: Panel,
    pub phases: PhaseSelection,
    #[serde(default)]
    pub units: UnitSelection,
    #[serde(default)]
    pub pre: Option<PhaseInput>,
    #[serde(default)]
    pub post: Option<PhaseInput>,
    #[serde(default)]
    pub meta: CaseMeta,
}

impl CaseInput {
    pub fn phase_input(&self, phase: ProtocolPhase) -> Option<&PhaseInput> {
        match phase {
            ProtocolPhase::Pre => self.pre.as_ref(),
            ProtocolPhase::Post => self.post.as_ref(),
        }
    }
}

// ============================================================================
// Evaluation Output Types
// ============================================================================

/// Everything derived for one phase of one case
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseEvaluation {
    pub phase: ProtocolPhase,
    pub left: AggregatedSite,
    pub right: AggregatedSite,
    pub ivc: AggregatedSite,
    pub ratios: DerivedRatios,
    pub classification: Classification,
    pub warnings: Vec<Warning>,
}

/// The complete result of one "calculate" invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseEvaluation {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Sample caps in force when the case was evaluated
    pub limits: SampleLimits,
    pub case: CaseInput,
    pub phases: Vec<PhaseEvaluation>,
}
