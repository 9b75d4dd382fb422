//! pulse-relay - Resilient heart-rate telemetry ingestion core.
//!
//! This library ingests a live heart-rate stream delivered over a
//! Phoenix-style publish/subscribe socket channel and turns it into a
//! continuously updated in-memory statistical summary plus a durable,
//! date-partitioned append log.
//!
//! # Architecture
//!
//! One supervisor owns one session at a time:
//!
//! - **KeyResolver**: fetches the overlay page and extracts the short-lived
//!   connection token
//! - **ChannelSession**: join handshake, heartbeat timer, inbound frame
//!   decode, sample fan-out
//! - **ConnectionManager**: retries forever on any failure with a fixed
//!   delay
//!
//! Key design principles:
//!
//! - Survive flaky networks, token expiry, and malformed frames
//!   indefinitely; the process never exits due to runtime errors
//! - Exactly one fan-out per accepted sample, in wire arrival order
//! - Statistics are pure functions of snapshot copies; O(n) work never
//!   blocks ingestion
//! - Durability is best-effort: one write + flush per sample, failures
//!   logged and swallowed
//!
//! # Quick Start
//!
//! ```no_run
//! use pulse_relay::{Relay, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let relay = Relay::builder()
//!         .source_url("https://app.hyperate.io/overlay?id=abc123")
//!         .build()?;
//!
//!     // Consumers subscribe independently.
//!     let mut samples = relay.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(sample) = samples.recv().await {
//!             println!("{} BPM at {}", sample.bpm, sample.iso_datetime);
//!         }
//!     });
//!
//!     // Reconnects forever; never returns under normal operation.
//!     relay.run().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Immutable per-session configuration |
//! | [`dispatch`] | Sample fan-out: [`Dispatcher`], [`IngestPipeline`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`metrics`] | Rolling window and derived statistics |
//! | [`protocol`] | Wire frame types (internal) |
//! | [`relay`] | Facade: [`Relay`], [`RelayBuilder`] |
//! | [`sample`] | The immutable [`Sample`] value |
//! | [`storage`] | Date-rotated durable log and export |
//! | [`transport`] | Key resolution, sessions, supervision |

// ============================================================================
// Modules
// ============================================================================

/// Immutable per-session configuration.
///
/// Constructed once, shared read-only; reload means building a new struct.
pub mod config;

/// Sample fan-out to sinks and subscribers.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// In-memory sample window and derived statistics.
pub mod metrics;

/// Wire protocol frame types.
///
/// Internal module defining the join/heartbeat/sample frame formats.
pub mod protocol;

/// Crate facade wiring sinks and supervisor together.
pub mod relay;

/// The immutable heart-rate sample value.
pub mod sample;

/// Durable, date-partitioned persistence.
pub mod storage;

/// Connection lifecycle: key resolution, sessions, supervision.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Facade types
pub use relay::{Relay, RelayBuilder};

// Configuration
pub use config::{Config, extract_channel_id};

// Sample value
pub use sample::Sample;

// Fan-out types
pub use dispatch::{Dispatcher, IngestPipeline};

// Metrics types
pub use metrics::{
    RangeBuckets, SampleAggregator, StatsSnapshot, Trend, TrendLabel, compute_stats,
};

// Storage types
pub use storage::{DailyLogWriter, ExportFormat, export_samples};

// Transport types
pub use transport::{ChannelSession, ConnectionManager, KeyResolver, SessionState};

// Error types
pub use error::{Error, Result};
