//! Snapshot export to flat files.
//!
//! Writes a window snapshot out for external tooling. Not part of the
//! ingestion path; exports read a snapshot copy and never touch the
//! daily log handles.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::error::{Error, Result};
use crate::sample::Sample;
use crate::storage::daily_log::CSV_HEADER;

// ============================================================================
// ExportFormat
// ============================================================================

/// Supported export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Header row plus one CSV record per sample.
    Csv,
    /// Pretty-printed JSON array.
    Json,
    /// Simple readable lines.
    Txt,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "txt" => Ok(Self::Txt),
            other => Err(Error::config(format!("unknown export format: {other}"))),
        }
    }
}

// ============================================================================
// Export
// ============================================================================

/// Writes `samples` to `path` in the requested format.
///
/// Returns the number of samples written. An empty snapshot produces a
/// header-only CSV, an empty JSON array, or a header-only text file.
///
/// # Errors
///
/// - [`Error::Io`] on write failure
/// - [`Error::Json`] on JSON serialization failure
pub fn export_samples(path: &Path, samples: &[Sample], format: ExportFormat) -> Result<usize> {
    let content = match format {
        ExportFormat::Csv => render_csv(samples),
        ExportFormat::Json => serde_json::to_string_pretty(samples)?,
        ExportFormat::Txt => render_txt(samples),
    };

    fs::write(path, content)?;
    info!(path = %path.display(), count = samples.len(), ?format, "exported samples");
    Ok(samples.len())
}

fn render_csv(samples: &[Sample]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for sample in samples {
        let _ = writeln!(
            out,
            "{:.6},{},{},{}",
            sample.timestamp,
            sample.bpm,
            sample.iso_datetime,
            sample.readable_time()
        );
    }
    out
}

fn render_txt(samples: &[Sample]) -> String {
    let mut out = String::from("timestamp,heart_rate(BPM),datetime\n");
    for sample in samples {
        let _ = writeln!(
            out,
            "{},{},{}",
            sample.timestamp, sample.bpm, sample.iso_datetime
        );
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::at(62, 1_700_000_000.0),
            Sample::at(75, 1_700_000_001.5),
        ]
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().expect("csv"), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().expect("json"), ExportFormat::Json);
        assert_eq!("Txt".parse::<ExportFormat>().expect("txt"), ExportFormat::Txt);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");

        let written = export_samples(&path, &samples(), ExportFormat::Csv).expect("export");
        assert_eq!(written, 2);

        let content = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].contains(",62,"));
        assert!(lines[2].contains(",75,"));
    }

    #[test]
    fn test_json_export_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");

        export_samples(&path, &samples(), ExportFormat::Json).expect("export");

        let content = fs::read_to_string(&path).expect("read");
        let parsed: Vec<Sample> = serde_json::from_str(&content).expect("parse");
        assert_eq!(parsed, samples());
    }

    #[test]
    fn test_txt_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");

        export_samples(&path, &samples(), ExportFormat::Txt).expect("export");

        let content = fs::read_to_string(&path).expect("read");
        assert!(content.starts_with("timestamp,heart_rate(BPM),datetime\n"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_empty_snapshot_exports_header_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.csv");

        let written = export_samples(&path, &[], ExportFormat::Csv).expect("export");
        assert_eq!(written, 0);

        let content = fs::read_to_string(&path).expect("read");
        assert_eq!(content.lines().count(), 1);
    }
}
