//! Append-only, date-rotated sample log.
//!
//! One CSV file per local calendar date. Every append is its own
//! durability unit: the record is written and flushed before the call
//! returns, with no buffering across calls. The handle is rebound
//! whenever an incoming sample's local date differs from the bound date.
//!
//! Persistence is best-effort: callers on the ingestion path log and
//! swallow [`Error::Persistence`] so a full disk never stops streaming.

// ============================================================================
// Imports
// ============================================================================

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::sample::{Sample, local_datetime};

// ============================================================================
// Constants
// ============================================================================

/// Header row written to every new log file.
pub const CSV_HEADER: &str = "timestamp,heart_rate,datetime,readable_time";

/// Per-day file name prefix.
const FILE_PREFIX: &str = "heart_rate_";

/// Per-day file name suffix.
const FILE_SUFFIX: &str = ".csv";

// ============================================================================
// DailyLogWriter
// ============================================================================

/// Owns one open append handle bound to a calendar date.
///
/// Not internally synchronized: the ingestion path is the single writer,
/// and the facade wraps the writer in a mutex for `clear`/`export` access.
#[derive(Debug)]
pub struct DailyLogWriter {
    /// Directory holding the per-day files.
    data_dir: PathBuf,
    /// Date the open handle is bound to.
    bound_date: Option<NaiveDate>,
    /// Open append handle.
    file: Option<File>,
}

impl DailyLogWriter {
    /// Creates the data directory and opens the handle for today.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the directory or file cannot be
    /// created.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| {
            Error::persistence(format!(
                "failed to create data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        let mut writer = Self {
            data_dir,
            bound_date: None,
            file: None,
        };
        writer.open_for_date(Local::now().date_naive())?;
        Ok(writer)
    }

    /// Path of the log file for a given date.
    #[must_use]
    pub fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.format("%Y-%m-%d")))
    }

    /// Date the open handle is currently bound to.
    #[inline]
    #[must_use]
    pub fn bound_date(&self) -> Option<NaiveDate> {
        self.bound_date
    }

    /// Path of the currently bound log file.
    #[must_use]
    pub fn current_path(&self) -> Option<PathBuf> {
        self.bound_date.map(|date| self.log_path(date))
    }

    /// Rebinds the handle when `timestamp` falls on a different local date.
    ///
    /// Precedes every append.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the new file cannot be opened.
    pub fn rotate_if_needed(&mut self, timestamp: f64) -> Result<()> {
        let date = local_datetime(timestamp)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| {
                Error::persistence(format!("timestamp {timestamp} outside representable range"))
            })?;

        if self.bound_date != Some(date) {
            info!(date = %date, "rotating daily log");
            self.open_for_date(date)?;
        }
        Ok(())
    }

    /// Appends one record to the file bound to the sample's date.
    ///
    /// Writes and flushes immediately; one durability unit per call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] on any write or rotation failure.
    pub fn append(&mut self, sample: &Sample) -> Result<()> {
        self.rotate_if_needed(sample.timestamp)?;

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::persistence("no open log handle"))?;

        writeln!(
            file,
            "{:.6},{},{},{}",
            sample.timestamp,
            sample.bpm,
            sample.iso_datetime,
            sample.readable_time()
        )
        .and_then(|()| file.flush())
        .map_err(|e| Error::persistence(format!("failed to append sample: {e}")))
    }

    /// Deletes every per-day file and rebinds a fresh handle for today.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the directory cannot be listed or
    /// the fresh handle cannot be opened. Individual file deletions that
    /// fail are logged and skipped.
    pub fn clear_all(&mut self) -> Result<()> {
        self.file = None;
        self.bound_date = None;

        let entries = fs::read_dir(&self.data_dir).map_err(|e| {
            Error::persistence(format!(
                "failed to list data directory {}: {e}",
                self.data_dir.display()
            ))
        })?;

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    warn!(file = %name, error = %e, "failed to delete log file");
                } else {
                    debug!(file = %name, "deleted log file");
                }
            }
        }

        self.open_for_date(Local::now().date_naive())
    }

    /// Opens (append, create) the file for `date`, writing the header when
    /// the file is new, and rebinds the handle.
    fn open_for_date(&mut self, date: NaiveDate) -> Result<()> {
        // Drop the old handle before binding the new date.
        self.file = None;

        let path = self.log_path(date);
        let existed = path.exists();

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| {
                Error::persistence(format!("failed to open {}: {e}", path.display()))
            })?;

        if !existed {
            writeln!(file, "{CSV_HEADER}")
                .and_then(|()| file.flush())
                .map_err(|e| {
                    Error::persistence(format!("failed to write header to {}: {e}", path.display()))
                })?;
        }

        debug!(path = %path.display(), "daily log bound");
        self.bound_date = Some(date);
        self.file = Some(file);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &std::path::Path) -> Vec<String> {
        fs::read_to_string(path)
            .expect("read log file")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_new_creates_directory_and_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("logs");

        let writer = DailyLogWriter::new(&nested).expect("writer");
        let path = writer.current_path().expect("bound path");

        assert!(nested.is_dir());
        assert_eq!(read_lines(&path), vec![CSV_HEADER.to_string()]);
    }

    #[test]
    fn test_append_writes_one_row_per_sample() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = DailyLogWriter::new(dir.path()).expect("writer");

        let sample = Sample::now(72);
        writer.append(&sample).expect("append");

        let lines = read_lines(&writer.current_path().expect("path"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADER);

        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1], "72");
        assert_eq!(fields[2], sample.iso_datetime);
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = DailyLogWriter::new(dir.path()).expect("writer");

        writer.append(&Sample::now(60)).expect("append");
        writer.append(&Sample::now(61)).expect("append");

        let lines = read_lines(&writer.current_path().expect("path"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| *l == CSV_HEADER).count(), 1);
    }

    #[test]
    fn test_rotation_across_calendar_dates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = DailyLogWriter::new(dir.path()).expect("writer");

        // Two days apart, so the local dates differ in any timezone.
        let first = Sample::at(70, 1_700_000_000.0);
        let second = Sample::at(80, 1_700_000_000.0 + 2.0 * 86_400.0);

        writer.append(&first).expect("append first");
        let first_path = writer.current_path().expect("path");

        writer.append(&second).expect("append second");
        let second_path = writer.current_path().expect("path");

        assert_ne!(first_path, second_path);
        assert_eq!(writer.bound_date(), second.local_date());

        // Each file: header plus exactly one data row.
        let first_lines = read_lines(&first_path);
        let second_lines = read_lines(&second_path);
        assert_eq!(first_lines.len(), 2);
        assert_eq!(second_lines.len(), 2);
        assert!(first_lines[1].contains(",70,"));
        assert!(second_lines[1].contains(",80,"));
    }

    #[test]
    fn test_rotate_if_needed_is_noop_for_same_date() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = DailyLogWriter::new(dir.path()).expect("writer");

        let bound = writer.bound_date();
        writer.rotate_if_needed(crate::sample::epoch_now()).expect("rotate");
        assert_eq!(writer.bound_date(), bound);
    }

    #[test]
    fn test_clear_all_deletes_and_reinitializes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = DailyLogWriter::new(dir.path()).expect("writer");

        writer.append(&Sample::at(70, 1_700_000_000.0)).expect("append");
        writer
            .append(&Sample::at(80, 1_700_000_000.0 + 2.0 * 86_400.0))
            .expect("append");

        writer.clear_all().expect("clear");

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .flatten()
            .map(|e| e.path())
            .collect();

        // Only the fresh handle for today remains, header only.
        assert_eq!(remaining.len(), 1);
        assert_eq!(read_lines(&remaining[0]), vec![CSV_HEADER.to_string()]);
        assert_eq!(remaining[0], writer.current_path().expect("path"));
    }
}
