//! The immutable heart-rate sample value.
//!
//! A [`Sample`] is created once, on frame decode, and never mutated.
//! Ownership is transferred to the aggregator and the durable log
//! independently (cloned, not shared-mutable).

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Sample
// ============================================================================

/// One accepted heart-rate reading.
///
/// # Fields
///
/// - `timestamp` - seconds since the Unix epoch, fractional
/// - `bpm` - integer beats per minute
/// - `iso_datetime` - local ISO-8601 rendering of `timestamp`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,

    /// Beats per minute.
    #[serde(rename = "heart_rate")]
    pub bpm: u32,

    /// Local ISO-8601 datetime string.
    #[serde(rename = "datetime")]
    pub iso_datetime: String,
}

impl Sample {
    /// Creates a sample stamped with the current wall-clock time.
    #[inline]
    #[must_use]
    pub fn now(bpm: u32) -> Self {
        Self::at(bpm, epoch_now())
    }

    /// Creates a sample at an explicit timestamp.
    #[must_use]
    pub fn at(bpm: u32, timestamp: f64) -> Self {
        let iso_datetime = local_datetime(timestamp)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
            .unwrap_or_default();

        Self {
            timestamp,
            bpm,
            iso_datetime,
        }
    }

    /// Local calendar date of this sample's timestamp, when representable.
    #[inline]
    #[must_use]
    pub fn local_date(&self) -> Option<chrono::NaiveDate> {
        local_datetime(self.timestamp).map(|dt| dt.date_naive())
    }

    /// Human-readable local time for log rows.
    #[must_use]
    pub fn readable_time(&self) -> String {
        local_datetime(self.timestamp)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

// ============================================================================
// Time Helpers
// ============================================================================

/// Current wall-clock time as fractional seconds since the Unix epoch.
#[inline]
#[must_use]
pub fn epoch_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Converts an epoch timestamp to a local datetime.
///
/// Returns `None` for timestamps outside chrono's representable range.
#[must_use]
pub fn local_datetime(timestamp: f64) -> Option<DateTime<Local>> {
    let secs = timestamp.trunc() as i64;
    let nanos = (timestamp.fract() * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos).map(|dt| dt.with_timezone(&Local))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_at_fields() {
        let sample = Sample::at(72, 1_700_000_000.25);
        assert_eq!(sample.bpm, 72);
        assert_eq!(sample.timestamp, 1_700_000_000.25);
        assert!(!sample.iso_datetime.is_empty());
    }

    #[test]
    fn test_sample_now_is_recent() {
        let before = epoch_now();
        let sample = Sample::now(65);
        let after = epoch_now();

        assert!(sample.timestamp >= before);
        assert!(sample.timestamp <= after);
    }

    #[test]
    fn test_local_date_matches_iso() {
        let sample = Sample::at(80, 1_700_000_000.0);
        let date = sample.local_date().expect("representable timestamp");
        assert!(sample.iso_datetime.starts_with(&date.format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn test_readable_time_format() {
        let sample = Sample::at(90, 1_700_000_000.0);
        let readable = sample.readable_time();
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(readable.len(), 19);
        assert_eq!(readable.as_bytes()[10], b' ');
    }

    #[test]
    fn test_serde_field_names() {
        let sample = Sample::at(100, 1_700_000_000.0);
        let json = serde_json::to_string(&sample).expect("serialize");
        assert!(json.contains("\"heart_rate\":100"));
        assert!(json.contains("\"datetime\""));
        assert!(json.contains("\"timestamp\""));
    }
}
