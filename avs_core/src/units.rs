//! Unit conversion for the two convertible analyte families.
//!
//! Laboratories report aldosterone in ng/dL or pg/mL and cortisol in
//! µg/dL or nmol/L. All internal math runs in the canonical units
//! (ng/dL for aldosterone, µg/dL for cortisol); values are converted on
//! the way in and, where a caller asks for it, on the way out.
//! Epinephrine (the catheterization marker of the cortisol panel) is
//! reported in pg/mL only and has no conversion.
//!
//! Conversions are exact constant factors and referentially transparent.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 1 ng/dL of aldosterone = 10 pg/mL
pub const ALDOSTERONE_PG_PER_NG_DL: f64 = 10.0;

/// 1 µg/dL of cortisol = 27.59 nmol/L
pub const CORTISOL_NMOL_PER_UG_DL: f64 = 27.59;

/// Analyte families handled by the engine
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalyteFamily {
    Aldosterone,
    Cortisol,
    Epinephrine,
}

impl AnalyteFamily {
    /// Unit tag of the family's canonical unit
    pub fn canonical_label(&self) -> &'static str {
        match self {
            AnalyteFamily::Aldosterone => "ng/dL",
            AnalyteFamily::Cortisol => "ug/dL",
            AnalyteFamily::Epinephrine => EPINEPHRINE_LABEL,
        }
    }
}

impl fmt::Display for AnalyteFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyteFamily::Aldosterone => f.write_str("aldosterone"),
            AnalyteFamily::Cortisol => f.write_str("cortisol"),
            AnalyteFamily::Epinephrine => f.write_str("epinephrine"),
        }
    }
}

/// Reporting units for aldosterone. Canonical: ng/dL.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AldosteroneUnit {
    #[default]
    #[serde(rename = "ng/dL")]
    NgPerDl,
    #[serde(rename = "pg/mL")]
    PgPerMl,
}

impl AldosteroneUnit {
    /// Convert a value expressed in this unit into canonical ng/dL
    pub fn to_canonical(&self, value: f64) -> f64 {
        match self {
            AldosteroneUnit::NgPerDl => value,
            AldosteroneUnit::PgPerMl => value / ALDOSTERONE_PG_PER_NG_DL,
        }
    }

    /// Convert a canonical ng/dL value into this unit
    pub fn from_canonical(&self, value: f64) -> f64 {
        match self {
            AldosteroneUnit::NgPerDl => value,
            AldosteroneUnit::PgPerMl => value * ALDOSTERONE_PG_PER_NG_DL,
        }
    }

    /// Printed unit tag
    pub fn label(&self) -> &'static str {
        match self {
            AldosteroneUnit::NgPerDl => "ng/dL",
            AldosteroneUnit::PgPerMl => "pg/mL",
        }
    }
}

impl fmt::Display for AldosteroneUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AldosteroneUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ng/dl" => Ok(AldosteroneUnit::NgPerDl),
            "pg/ml" => Ok(AldosteroneUnit::PgPerMl),
            other => Err(Error::UnitConversion(other.to_string())),
        }
    }
}

/// Reporting units for cortisol. Canonical: µg/dL.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CortisolUnit {
    #[default]
    #[serde(rename = "ug/dL")]
    UgPerDl,
    #[serde(rename = "nmol/L")]
    NmolPerL,
}

impl CortisolUnit {
    /// Convert a value expressed in this unit into canonical µg/dL
    pub fn to_canonical(&self, value: f64) -> f64 {
        match self {
            CortisolUnit::UgPerDl => value,
            CortisolUnit::NmolPerL => value / CORTISOL_NMOL_PER_UG_DL,
        }
    }

    /// Convert a canonical µg/dL value into this unit
    pub fn from_canonical(&self, value: f64) -> f64 {
        match self {
            CortisolUnit::UgPerDl => value,
            CortisolUnit::NmolPerL => value * CORTISOL_NMOL_PER_UG_DL,
        }
    }

    /// Printed unit tag
    pub fn label(&self) -> &'static str {
        match self {
            CortisolUnit::UgPerDl => "ug/dL",
            CortisolUnit::NmolPerL => "nmol/L",
        }
    }
}

impl fmt::Display for CortisolUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CortisolUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            // µ and u are both accepted on input; the printed tag uses u
            "ug/dl" | "µg/dl" | "mcg/dl" => Ok(CortisolUnit::UgPerDl),
            "nmol/l" => Ok(CortisolUnit::NmolPerL),
            other => Err(Error::UnitConversion(other.to_string())),
        }
    }
}

/// Unit tag for epinephrine (fixed, no conversion)
pub const EPINEPHRINE_LABEL: &str = "pg/mL";

/// Per-family unit selection for one case
///
/// Only the two convertible families carry a choice; epinephrine is
/// always pg/mL.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitSelection {
    #[serde(default)]
    pub aldosterone: AldosteroneUnit,
    #[serde(default)]
    pub cortisol: CortisolUnit,
}
