//! Quality score policy
//!
//! A cycle's score blends three factors in `[0, 1]`: how many of the
//! configured sources contributed, how many canonical fields each one
//! reported, and how old the oldest contributing reading is.

use std::time::Duration;

use crate::PolicyError;

/// Weights and freshness horizon for [`quality_score`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityPolicy {
    pub coverage_weight: f64,
    pub completeness_weight: f64,
    pub freshness_weight: f64,
    /// Staleness up to this is fully fresh; beyond it freshness halves
    /// every further interval
    pub expected_interval: Duration,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            coverage_weight: 0.5,
            completeness_weight: 0.3,
            freshness_weight: 0.2,
            expected_interval: Duration::from_secs(1200),
        }
    }
}

impl QualityPolicy {
    /// Validated constructor
    pub fn new(
        coverage_weight: f64,
        completeness_weight: f64,
        freshness_weight: f64,
        expected_interval: Duration,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            coverage_weight,
            completeness_weight,
            freshness_weight,
            expected_interval,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Coverage and completeness weights must be positive so that a
    /// missing source or field always lowers the score
    pub fn validate(&self) -> Result<(), PolicyError> {
        positive("coverage_weight", self.coverage_weight)?;
        positive("completeness_weight", self.completeness_weight)?;
        if !self.freshness_weight.is_finite() || self.freshness_weight < 0.0 {
            return Err(PolicyError::InvalidWeight {
                name: "freshness_weight",
                value: self.freshness_weight,
            });
        }
        if self.expected_interval.is_zero() {
            return Err(PolicyError::ZeroInterval);
        }
        Ok(())
    }

    /// 1.0 within the expected interval, exponential decay after
    pub fn freshness(&self, staleness_secs: f64) -> f64 {
        let interval = self.expected_interval.as_secs_f64();
        let staleness = staleness_secs.max(0.0);
        if staleness <= interval {
            1.0
        } else {
            0.5_f64.powf((staleness - interval) / interval)
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), PolicyError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PolicyError::InvalidWeight { name, value })
    }
}

/// What the score is computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityInputs {
    pub contributing: usize,
    pub configured: usize,
    /// Mean per-source fraction of the canonical metric set
    pub completeness: f64,
    /// Seconds since the oldest contributing reading was observed
    pub staleness_secs: f64,
}

impl QualityInputs {
    pub fn coverage(&self) -> f64 {
        let configured = self.configured.max(self.contributing);
        if configured == 0 {
            return 0.0;
        }
        (self.contributing as f64 / configured as f64).min(1.0)
    }
}

/// Weighted mean of coverage, completeness and freshness, in `[0, 1]`
pub fn quality_score(policy: &QualityPolicy, inputs: &QualityInputs) -> f64 {
    let total = policy.coverage_weight + policy.completeness_weight + policy.freshness_weight;
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    let completeness = inputs.completeness.clamp(0.0, 1.0);
    let weighted = policy.coverage_weight * inputs.coverage()
        + policy.completeness_weight * completeness
        + policy.freshness_weight * policy.freshness(inputs.staleness_secs);
    (weighted / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(contributing: usize, configured: usize, completeness: f64) -> QualityInputs {
        QualityInputs {
            contributing,
            configured,
            completeness,
            staleness_secs: 0.0,
        }
    }

    #[test]
    fn test_perfect_cycle_scores_one() {
        let score = quality_score(&QualityPolicy::default(), &inputs(5, 5, 1.0));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_source_lowers_score() {
        let policy = QualityPolicy::default();
        let full = quality_score(&policy, &inputs(5, 5, 1.0));
        let partial = quality_score(&policy, &inputs(4, 5, 1.0));
        assert!(partial < full);
        assert!(partial < 1.0);
    }

    #[test]
    fn test_missing_fields_lower_score() {
        let policy = QualityPolicy::default();
        assert!(quality_score(&policy, &inputs(5, 5, 0.8)) < 1.0);
    }

    #[test]
    fn test_freshness_decay() {
        let policy = QualityPolicy::default();
        assert_eq!(policy.freshness(0.0), 1.0);
        assert_eq!(policy.freshness(1200.0), 1.0);
        assert!((policy.freshness(2400.0) - 0.5).abs() < 1e-12);
        assert!((policy.freshness(3600.0) - 0.25).abs() < 1e-12);
        // Clock skew puts fetches in the future
        assert_eq!(policy.freshness(-30.0), 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let d = Duration::from_secs(60);
        assert!(QualityPolicy::new(0.0, 0.3, 0.2, d).is_err());
        assert!(QualityPolicy::new(0.5, -1.0, 0.2, d).is_err());
        assert!(QualityPolicy::new(0.5, 0.3, f64::NAN, d).is_err());
        assert_eq!(
            QualityPolicy::new(0.5, 0.3, 0.2, Duration::ZERO),
            Err(PolicyError::ZeroInterval)
        );
        assert!(QualityPolicy::new(0.5, 0.3, 0.0, d).is_ok());
    }

    #[test]
    fn test_coverage_caps_at_one() {
        assert_eq!(inputs(6, 5, 1.0).coverage(), 1.0);
        assert_eq!(inputs(0, 0, 0.0).coverage(), 0.0);
        assert_eq!(inputs(2, 0, 1.0).coverage(), 1.0);
    }
}
