//! Durable, date-partitioned persistence.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `daily_log` | Append-only date-rotated CSV writer, [`DailyLogWriter`] |
//! | `export` | One-shot snapshot export, [`ExportFormat`] |

// ============================================================================
// Submodules
// ============================================================================

/// Append-only, date-rotated sample log.
pub mod daily_log;

/// Snapshot export to flat files.
pub mod export;

// ============================================================================
// Re-exports
// ============================================================================

pub use daily_log::{CSV_HEADER, DailyLogWriter};
pub use export::{ExportFormat, export_samples};
