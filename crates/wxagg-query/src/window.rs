//! History windows and their derived statistics

use serde::Serialize;
use std::collections::BTreeMap;
use wxagg_core::{iso_seconds, Accumulator, CanonicalObservation, Metric, Timestamp};

pub const MIN_HISTORY_HOURS: i64 = 1;
pub const MAX_HISTORY_HOURS: i64 = 168;
pub const DEFAULT_HISTORY_HOURS: i64 = 24;

/// Clamp a requested window length into `[1, 168]` hours
pub fn clamp_hours(hours: i64) -> i64 {
    hours.clamp(MIN_HISTORY_HOURS, MAX_HISTORY_HOURS)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    #[serde(with = "iso_seconds")]
    pub start: Timestamp,
    #[serde(with = "iso_seconds")]
    pub end: Timestamp,
    pub hours: i64,
}

/// Average and extrema of one metric's point values across a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Observations in `[start, end]`, ascending, with per-metric statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryWindow {
    pub location: String,
    pub period: Period,
    pub data_points: usize,
    pub statistics: BTreeMap<Metric, WindowStats>,
    #[serde(rename = "history")]
    pub observations: Vec<CanonicalObservation>,
}

impl HistoryWindow {
    pub fn new(location: impl Into<String>, period: Period, observations: Vec<CanonicalObservation>) -> Self {
        Self {
            location: location.into(),
            period,
            data_points: observations.len(),
            statistics: window_statistics(&observations),
            observations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_points == 0
    }
}

/// Statistics over point values, not over each point's own min/max
pub fn window_statistics(observations: &[CanonicalObservation]) -> BTreeMap<Metric, WindowStats> {
    let mut accumulators: BTreeMap<Metric, Accumulator> = BTreeMap::new();
    for obs in observations {
        for metric in Metric::ALL.into_iter().filter(Metric::is_numeric) {
            if let Some(v) = obs.value(metric) {
                accumulators.entry(metric).or_default().add(v);
            }
        }
    }

    accumulators
        .into_iter()
        .filter_map(|(metric, acc)| {
            acc.summary().map(|s| {
                (
                    metric,
                    WindowStats {
                        avg: s.mean,
                        min: s.min,
                        max: s.max,
                    },
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wxagg_core::{MetricValue, NumericSummary};

    fn point(hour: u32, temp: f64, spread: f64) -> CanonicalObservation {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            Metric::Temperature,
            MetricValue::Numeric(NumericSummary {
                value: temp,
                min: temp - spread,
                max: temp + spread,
                count: 2,
            }),
        );
        metrics.insert(
            Metric::WeatherDescription,
            MetricValue::Categorical("Clear".into()),
        );
        CanonicalObservation {
            location: "here".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap(),
            metrics,
            sources: vec!["a".into()],
            quality_score: 0.9,
            ttl: 0,
        }
    }

    #[test]
    fn test_clamp_hours() {
        assert_eq!(clamp_hours(0), 1);
        assert_eq!(clamp_hours(-5), 1);
        assert_eq!(clamp_hours(24), 24);
        assert_eq!(clamp_hours(9999), 168);
    }

    #[test]
    fn test_statistics_use_point_values() {
        let stats = window_statistics(&[point(1, 20.0, 5.0), point(2, 22.0, 5.0)]);
        let t = stats[&Metric::Temperature];
        assert_eq!((t.avg, t.min, t.max), (21.0, 20.0, 22.0));
        assert!(!stats.contains_key(&Metric::WeatherDescription));
        assert!(!stats.contains_key(&Metric::Humidity));
    }

    #[test]
    fn test_empty_window() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let window = HistoryWindow::new(
            "here",
            Period {
                start: at,
                end: at,
                hours: 1,
            },
            Vec::new(),
        );
        assert!(window.is_empty());
        assert!(window.statistics.is_empty());
    }
}
