//! Per-site sample aggregation.
//!
//! Each vascular site contributes one or more timed samples per phase;
//! this module collapses them into a single representative pair of
//! analyte means. Per-site sample caps are asymmetric (the right
//! adrenal vein is the difficult cannulation, so protocols draw more
//! confirmatory samples there) and are carried as inspectable
//! configuration rather than constants inside the averaging math.

use crate::error::{Error, Result};
use crate::types::{AggregatedSite, ProtocolPhase, Sample, Site, SiteSampleSet};
use serde::{Deserialize, Serialize};

// ============================================================================
// Sample Limits
// ============================================================================

/// Maximum sample rows accepted per site
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleLimits {
    #[serde(default = "default_left_limit")]
    pub left: usize,
    #[serde(default = "default_right_limit")]
    pub right: usize,
    #[serde(default = "default_ivc_limit")]
    pub ivc: usize,
}

fn default_left_limit() -> usize {
    2
}

fn default_right_limit() -> usize {
    4
}

fn default_ivc_limit() -> usize {
    2
}

impl Default for SampleLimits {
    fn default() -> Self {
        SampleLimits {
            left: default_left_limit(),
            right: default_right_limit(),
            ivc: default_ivc_limit(),
        }
    }
}

impl SampleLimits {
    pub fn for_site(&self, site: Site) -> usize {
        match site {
            Site::Left => self.left,
            Site::Right => self.right,
            Site::Ivc => self.ivc,
        }
    }
}

// ============================================================================
// Set Construction
// ============================================================================

impl SiteSampleSet {
    /// Build a site's sample set, discarding blank rows and enforcing
    /// the site's cap
    ///
    /// Exceeding the cap is a contract violation by the caller and is
    /// fatal; an entry form sized to the caps cannot produce it.
    pub fn new(
        site: Site,
        phase: ProtocolPhase,
        samples: Vec<Sample>,
        limits: &SampleLimits,
    ) -> Result<Self> {
        let total = samples.len();
        let samples: Vec<Sample> = samples.into_iter().filter(|s| !s.is_blank()).collect();
        if samples.len() < total {
            tracing::debug!(
                "Discarded {} blank sample row(s) for the {} site",
                total - samples.len(),
                site
            );
        }

        let limit = limits.for_site(site);
        if samples.len() > limit {
            return Err(Error::SampleLimit {
                site,
                given: samples.len(),
                limit,
            });
        }

        Ok(SiteSampleSet {
            site,
            phase,
            samples,
        })
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Collapse a site's samples into independent per-analyte means
///
/// At least one sample carrying both analytes is required; without one
/// the site cannot anchor any ratio and aggregation fails with
/// [`Error::MissingData`]. Partial samples still contribute to the mean
/// of whichever analyte they do carry. The mean is unweighted, so the
/// result is invariant under sample reordering.
pub fn aggregate(set: &SiteSampleSet) -> Result<AggregatedSite> {
    let valid_sample_count = set.samples.iter().filter(|s| s.is_complete()).count();
    if valid_sample_count == 0 {
        return Err(Error::MissingData {
            site: set.site,
            phase: set.phase,
        });
    }

    let mean_primary = mean(set.samples.iter().filter_map(|s| s.primary));
    let mean_companion = mean(set.samples.iter().filter_map(|s| s.companion));

    tracing::debug!(
        "Aggregated {} {} phase: primary {:.2}, companion {:.2} ({} valid sample(s))",
        set.site,
        set.phase,
        mean_primary,
        mean_companion,
        valid_sample_count
    );

    Ok(AggregatedSite {
        site: set.site,
        mean_primary,
        mean_companion,
        valid_sample_count,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    // a complete sample exists, so each analyte has at least one value
    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(primary: Option<f64>, companion: Option<f64>) -> Sample {
        Sample {
            site: Site::Left,
            drawn_at: None,
            primary,
            companion,
        }
    }

    fn set(samples: Vec<Sample>) -> SiteSampleSet {
        SiteSampleSet::new(
            Site::Left,
            ProtocolPhase::Post,
            samples,
            &SampleLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_aggregate_simple_means() {
        let agg = aggregate(&set(vec![
            sample(Some(100.0), Some(800.0)),
            sample(Some(200.0), Some(900.0)),
        ]))
        .unwrap();
        assert_eq!(agg.mean_primary, 150.0);
        assert_eq!(agg.mean_companion, 850.0);
        assert_eq!(agg.valid_sample_count, 2);
    }

    #[test]
    fn test_partial_samples_contribute_to_their_analyte_only() {
        let agg = aggregate(&set(vec![
            sample(Some(10.0), None),
            sample(Some(20.0), Some(30.0)),
        ]))
        .unwrap();
        assert_eq!(agg.mean_primary, 15.0);
        assert_eq!(agg.mean_companion, 30.0);
        // only the second sample is complete
        assert_eq!(agg.valid_sample_count, 1);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let limits = SampleLimits::default();
        let forward = SiteSampleSet::new(
            Site::Right,
            ProtocolPhase::Pre,
            vec![
                sample(Some(1.0), Some(4.0)),
                sample(Some(2.0), None),
                sample(None, Some(6.0)),
            ],
            &limits,
        )
        .unwrap();
        let backward = SiteSampleSet::new(
            Site::Right,
            ProtocolPhase::Pre,
            vec![
                sample(None, Some(6.0)),
                sample(Some(2.0), None),
                sample(Some(1.0), Some(4.0)),
            ],
            &limits,
        )
        .unwrap();
        let a = aggregate(&forward).unwrap();
        let b = aggregate(&backward).unwrap();
        assert_eq!(a.mean_primary, b.mean_primary);
        assert_eq!(a.mean_companion, b.mean_companion);
        assert_eq!(a.valid_sample_count, b.valid_sample_count);
    }

    #[test]
    fn test_no_complete_sample_is_missing_data() {
        let err = aggregate(&set(vec![
            sample(Some(10.0), None),
            sample(None, Some(20.0)),
        ]))
        .unwrap_err();
        match err {
            Error::MissingData { site, phase } => {
                assert_eq!(site, Site::Left);
                assert_eq!(phase, ProtocolPhase::Post);
            }
            other => panic!("expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_rows_are_discarded_before_the_cap() {
        // four rows on the left, two of them blank, fits the cap of two
        let result = SiteSampleSet::new(
            Site::Left,
            ProtocolPhase::Pre,
            vec![
                sample(None, None),
                sample(Some(5.0), Some(6.0)),
                sample(None, None),
                sample(Some(7.0), Some(8.0)),
            ],
            &SampleLimits::default(),
        );
        assert!(result.is_ok());
        assert_eq!(result.unwrap().samples.len(), 2);
    }

    #[test]
    fn test_exceeding_the_site_cap_is_fatal() {
        let err = SiteSampleSet::new(
            Site::Ivc,
            ProtocolPhase::Pre,
            vec![
                sample(Some(1.0), Some(1.0)),
                sample(Some(2.0), Some(2.0)),
                sample(Some(3.0), Some(3.0)),
            ],
            &SampleLimits::default(),
        )
        .unwrap_err();
        match err {
            Error::SampleLimit { site, given, limit } => {
                assert_eq!(site, Site::Ivc);
                assert_eq!(given, 3);
                assert_eq!(limit, 2);
            }
            other => panic!("expected SampleLimit, got {other:?}"),
        }
    }

    #[test]
    fn test_asymmetric_default_caps() {
        let limits = SampleLimits::default();
        assert_eq!(limits.for_site(Site::Right), 4);
        assert_eq!(limits.for_site(Site::Left), 2);
        assert_eq!(limits.for_site(Site::Ivc), 2);
    }
}
