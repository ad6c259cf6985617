//! Merge partial observations into one canonical record

use chrono::Duration;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use wxagg_core::{
    truncate_to_seconds, Accumulator, CanonicalObservation, FieldValue, Metric, MetricValue,
    NumericSummary, PartialObservation, Timestamp,
};

use crate::{quality_score, CollectionFailure, QualityInputs, QualityPolicy, SourceFailure};

pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Pure merge step of a collection cycle
#[derive(Debug, Clone)]
pub struct Aggregator {
    location: String,
    configured_sources: usize,
    policy: QualityPolicy,
    retention: Duration,
}

impl Aggregator {
    pub fn new(location: impl Into<String>, configured_sources: usize, policy: QualityPolicy) -> Self {
        Self {
            location: location.into(),
            configured_sources,
            policy,
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn configured_sources(&self) -> usize {
        self.configured_sources
    }

    /// Merge one cycle's partials.
    ///
    /// Only contributing partials (no error, at least one field) take part.
    /// Numeric metrics become mean/min/max/count; the weather description
    /// becomes the most frequent string, ties going to the first seen.
    /// Fails when nothing contributed.
    pub fn aggregate(
        &self,
        partials: &[PartialObservation],
        now: Timestamp,
    ) -> Result<CanonicalObservation, CollectionFailure> {
        let mut seen = HashSet::new();
        let contributing: Vec<&PartialObservation> = partials
            .iter()
            .filter(|p| p.is_contributing())
            .filter(|p| seen.insert(p.source_id.as_str()))
            .collect();

        if contributing.is_empty() {
            return Err(CollectionFailure {
                attempted: partials.len(),
                failures: partials
                    .iter()
                    .map(|p| SourceFailure {
                        source_id: p.source_id.clone(),
                        reason: p
                            .error
                            .clone()
                            .unwrap_or_else(|| "no fields reported".to_string()),
                    })
                    .collect(),
            });
        }

        let mut numeric: BTreeMap<Metric, Accumulator> = BTreeMap::new();
        let mut categorical: BTreeMap<Metric, Tally> = BTreeMap::new();
        for partial in &contributing {
            for (metric, value) in &partial.fields {
                match (metric.is_numeric(), value) {
                    (true, FieldValue::Number(v)) => numeric.entry(*metric).or_default().add(*v),
                    (false, FieldValue::Text(s)) => categorical.entry(*metric).or_default().add(s),
                    _ => debug!(
                        source = %partial.source_id,
                        metric = metric.name(),
                        "value kind does not match metric, skipped"
                    ),
                }
            }
        }

        let mut metrics = BTreeMap::new();
        for (metric, acc) in numeric {
            if let Some(summary) = acc.summary() {
                metrics.insert(
                    metric,
                    MetricValue::Numeric(NumericSummary {
                        value: summary.mean,
                        min: summary.min,
                        max: summary.max,
                        count: summary.count,
                    }),
                );
            }
        }
        for (metric, tally) in categorical {
            if let Some(winner) = tally.winner() {
                metrics.insert(metric, MetricValue::Categorical(winner.to_string()));
            }
        }

        let oldest = contributing
            .iter()
            .map(|p| p.data_time())
            .min()
            .unwrap_or(now);
        let inputs = QualityInputs {
            contributing: contributing.len(),
            configured: self.configured_sources,
            completeness: contributing.iter().map(|p| p.completeness()).sum::<f64>()
                / contributing.len() as f64,
            staleness_secs: ((now - oldest).num_milliseconds() as f64 / 1000.0).max(0.0),
        };

        let timestamp = truncate_to_seconds(now);
        Ok(CanonicalObservation {
            location: self.location.clone(),
            timestamp,
            metrics,
            sources: contributing.iter().map(|p| p.source_id.clone()).collect(),
            quality_score: quality_score(&self.policy, &inputs),
            ttl: (timestamp + self.retention).timestamp(),
        })
    }
}

/// Occurrence counts in first-seen order
#[derive(Debug, Default)]
struct Tally {
    entries: Vec<(String, usize)>,
}

impl Tally {
    fn add(&mut self, value: &str) {
        match self.entries.iter_mut().find(|(v, _)| v == value) {
            Some((_, n)) => *n += 1,
            None => self.entries.push((value.to_string(), 1)),
        }
    }

    fn winner(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(v, _)| v.as_str())
    }
}
