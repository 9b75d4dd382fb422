//! Derived statistics over a sample snapshot.
//!
//! [`compute_stats`] is a pure function of its input sample set: snapshots
//! are recomputed on demand and never stored. Semantics worth noting:
//!
//! - `median` is the direct sorted-index middle element (`sorted[len / 2]`),
//!   not the average of two middle elements
//! - `std_dev` uses the `n - 1` denominator (sample variance), 0 for a
//!   single sample
//! - the trend is only present once 10 samples are available and looks at
//!   the last 10 values

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sample::Sample;

// ============================================================================
// Constants
// ============================================================================

/// Number of trailing samples the trend regression looks at.
pub const TREND_WINDOW: usize = 10;

// ============================================================================
// StatsSnapshot
// ============================================================================

/// Point-in-time statistical summary of a sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Number of samples.
    pub count: usize,

    /// Lowest BPM.
    pub min: u32,

    /// Highest BPM.
    pub max: u32,

    /// Arithmetic mean, rounded to 1 decimal.
    pub mean: f64,

    /// Sorted-order middle element.
    pub median: u32,

    /// Sample standard deviation (`n - 1` denominator), rounded to
    /// 2 decimals. 0 when fewer than two samples.
    pub std_dev: f64,

    /// Seconds between the earliest and latest sample.
    pub duration_seconds: f64,

    /// Minutes between the earliest and latest sample, rounded to 1 decimal.
    pub duration_minutes: f64,

    /// Raw counts per fixed BPM range.
    pub ranges: RangeBuckets,

    /// Short-term trend; present once [`TREND_WINDOW`] samples exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl StatsSnapshot {
    /// Renders a plain-text summary for display surfaces.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "=== Heart Rate Statistics ===".to_string(),
            format!("Samples: {}", self.count),
            format!("Duration: {} minutes", self.duration_minutes),
            "--- Range ---".to_string(),
            format!("Min: {} BPM", self.min),
            format!("Max: {} BPM", self.max),
            format!("Mean: {} BPM", self.mean),
            format!("Median: {} BPM", self.median),
            format!("Std dev: {} BPM", self.std_dev),
            "--- Zones ---".to_string(),
            format!("very low (<50): {}", self.ranges.very_low),
            format!("low (50-59): {}", self.ranges.low),
            format!("normal (60-99): {}", self.ranges.normal),
            format!("elevated (100-139): {}", self.ranges.elevated),
            format!("high (>=140): {}", self.ranges.high),
        ];

        if let Some(ref trend) = self.trend {
            lines.push("--- Trend ---".to_string());
            lines.push(format!("Current trend: {}", trend.label));
        }

        lines.join("\n")
    }
}

// ============================================================================
// RangeBuckets
// ============================================================================

/// Counts per fixed BPM range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBuckets {
    /// BPM < 50.
    pub very_low: usize,
    /// 50 <= BPM < 60.
    pub low: usize,
    /// 60 <= BPM < 100.
    pub normal: usize,
    /// 100 <= BPM < 140.
    pub elevated: usize,
    /// BPM >= 140.
    pub high: usize,
}

impl RangeBuckets {
    /// Tallies a set of BPM values into buckets.
    #[must_use]
    pub fn tally(values: &[u32]) -> Self {
        let mut buckets = Self::default();
        for &bpm in values {
            match bpm {
                0..=49 => buckets.very_low += 1,
                50..=59 => buckets.low += 1,
                60..=99 => buckets.normal += 1,
                100..=139 => buckets.elevated += 1,
                _ => buckets.high += 1,
            }
        }
        buckets
    }

    /// Total count across all buckets.
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.very_low + self.low + self.normal + self.elevated + self.high
    }
}

// ============================================================================
// Trend
// ============================================================================

/// Short-term directional movement of the metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Least-squares regression slope of the last [`TREND_WINDOW`] values
    /// against index 0..9, rounded to 3 decimals.
    pub slope: f64,

    /// Classification of the slope.
    pub label: TrendLabel,
}

/// Trend classification by slope thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    /// slope > 0.5
    Rising,
    /// 0.1 < slope <= 0.5
    SlowlyRising,
    /// -0.1 <= slope <= 0.1
    Stable,
    /// -0.5 <= slope < -0.1
    SlowlyFalling,
    /// slope < -0.5
    Falling,
}

impl TrendLabel {
    /// Classifies a regression slope.
    #[must_use]
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.5 {
            Self::Rising
        } else if slope < -0.5 {
            Self::Falling
        } else if slope > 0.1 {
            Self::SlowlyRising
        } else if slope < -0.1 {
            Self::SlowlyFalling
        } else {
            Self::Stable
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rising => "rising",
            Self::SlowlyRising => "slowly rising",
            Self::Stable => "stable",
            Self::SlowlyFalling => "slowly falling",
            Self::Falling => "falling",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Computation
// ============================================================================

/// Computes a [`StatsSnapshot`] from a sample set.
///
/// Pure function; returns `None` for empty input.
#[must_use]
pub fn compute_stats(samples: &[Sample]) -> Option<StatsSnapshot> {
    if samples.is_empty() {
        return None;
    }

    let values: Vec<u32> = samples.iter().map(|s| s.bpm).collect();
    let count = values.len();

    let min = *values.iter().min()?;
    let max = *values.iter().max()?;

    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    let mean = round1(sum as f64 / count as f64);

    let median = {
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted[count / 2]
    };

    let std_dev = if count > 1 {
        let variance = values
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        round2(variance.sqrt())
    } else {
        0.0
    };

    let (first_ts, last_ts) = samples.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), sample| (lo.min(sample.timestamp), hi.max(sample.timestamp)),
    );
    let duration_seconds = last_ts - first_ts;
    let duration_minutes = round1(duration_seconds / 60.0);

    let ranges = RangeBuckets::tally(&values);

    let trend = (count >= TREND_WINDOW).then(|| {
        let tail = &values[count - TREND_WINDOW..];
        let slope = round3(least_squares_slope(tail));
        Trend {
            slope,
            label: TrendLabel::from_slope(slope),
        }
    });

    Some(StatsSnapshot {
        count,
        min,
        max,
        mean,
        median,
        std_dev,
        duration_seconds,
        duration_minutes,
        ranges,
        trend,
    })
}

/// Least-squares linear regression slope of `values` against index 0..n.
///
/// Returns 0 for degenerate inputs (fewer than two values).
#[must_use]
pub fn least_squares_slope(values: &[u32]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }

    let sum_x: f64 = (0..values.len()).map(|x| x as f64).sum();
    let sum_y: f64 = values.iter().map(|&y| f64::from(y)).sum();
    let sum_xy: f64 = values
        .iter()
        .enumerate()
        .map(|(x, &y)| x as f64 * f64::from(y))
        .sum();
    let sum_x2: f64 = (0..values.len()).map(|x| (x as f64).powi(2)).sum();

    let denominator = n * sum_x2 - sum_x.powi(2);
    if denominator == 0.0 {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}

// ============================================================================
// Rounding
// ============================================================================

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ============================================================================
// Tests
// ============================================================================
