//! Crate facade: wires sinks together and runs the supervisor.
//!
//! A [`Relay`] owns the rolling window, the durable log, and the consumer
//! fan-out. Build one with [`Relay::builder()`], subscribe any number of
//! consumers, then call [`Relay::run`] — it reconnects forever.
//!
//! # Example
//!
//! ```no_run
//! use pulse_relay::{Relay, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let relay = Relay::builder()
//!         .source_url("https://app.hyperate.io/overlay?id=abc123")
//!         .data_dir("heart_rate_data")
//!         .build()?;
//!
//!     let mut samples = relay.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(sample) = samples.recv().await {
//!             println!("{} BPM", sample.bpm);
//!         }
//!     });
//!
//!     relay.run().await;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::dispatch::{Dispatcher, IngestPipeline};
use crate::error::{Error, Result};
use crate::metrics::{SampleAggregator, StatsSnapshot};
use crate::sample::Sample;
use crate::storage::{DailyLogWriter, ExportFormat, export_samples};
use crate::transport::ConnectionManager;

// ============================================================================
// Relay
// ============================================================================

/// The assembled ingestion core.
///
/// # Thread Safety
///
/// `Relay` is `Send + Sync`; statistics and exports may be read from any
/// task while the supervisor's ingestion path writes.
#[derive(Debug)]
pub struct Relay {
    /// Shared, immutable configuration.
    config: Arc<Config>,
    /// Rolling window of recent samples.
    aggregator: Arc<SampleAggregator>,
    /// Durable date-rotated log.
    log: Arc<Mutex<DailyLogWriter>>,
    /// Consumer fan-out.
    dispatcher: Dispatcher,
}

impl Relay {
    /// Creates a builder for configuring a relay.
    #[inline]
    #[must_use]
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    /// Creates a relay from an explicit configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration fails validation
    /// - [`Error::Persistence`] if the log directory cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let aggregator = Arc::new(SampleAggregator::new(config.window_capacity));
        let log = Arc::new(Mutex::new(DailyLogWriter::new(&config.data_dir)?));
        let dispatcher = Dispatcher::new(config.dispatch_capacity);

        Ok(Self {
            config: Arc::new(config),
            aggregator,
            log,
            dispatcher,
        })
    }

    /// The active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hands out an independent receiver of all future samples.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Sample> {
        self.dispatcher.subscribe()
    }

    /// The shared rolling window.
    #[inline]
    #[must_use]
    pub fn aggregator(&self) -> &SampleAggregator {
        &self.aggregator
    }

    /// Statistics over the last `minutes` minutes.
    #[must_use]
    pub fn recent_stats(&self, minutes: u64) -> Option<StatsSnapshot> {
        self.aggregator.recent_stats(minutes)
    }

    /// Statistics over the full retained window.
    #[must_use]
    pub fn overall_stats(&self) -> Option<StatsSnapshot> {
        self.aggregator.overall_stats()
    }

    /// Empties the window and resets the durable log.
    ///
    /// Deletes every per-day file and rebinds a fresh handle for today.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the log cannot be reset.
    pub fn clear(&self) -> Result<()> {
        self.aggregator.clear();
        self.log.lock().clear_all()
    }

    /// Exports a window snapshot to `path`.
    ///
    /// `minutes` limits the snapshot to the most recent span; `None`
    /// exports the full window. Returns the number of samples written.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] on write failure
    /// - [`Error::Json`] on JSON serialization failure
    pub fn export(
        &self,
        path: &Path,
        format: ExportFormat,
        minutes: Option<u64>,
    ) -> Result<usize> {
        let samples = match minutes {
            Some(minutes) => self.aggregator.recent(minutes),
            None => self.aggregator.all(),
        };
        export_samples(path, &samples, format)
    }

    /// The per-sample fan-out handed to sessions.
    #[must_use]
    pub fn pipeline(&self) -> IngestPipeline {
        IngestPipeline::new(
            Arc::clone(&self.aggregator),
            Arc::clone(&self.log),
            self.dispatcher.clone(),
        )
    }

    /// Runs the connection supervisor; never returns under normal
    /// operation.
    pub async fn run(&self) {
        ConnectionManager::new(Arc::clone(&self.config), self.pipeline())
            .run()
            .await;
    }
}

// ============================================================================
// RelayBuilder
// ============================================================================

/// Builder for configuring a [`Relay`] instance.
///
/// Use [`Relay::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct RelayBuilder {
    /// Overlay page URL.
    source_url: Option<String>,
    /// Socket endpoint override.
    socket_url: Option<String>,
    /// Log directory override.
    data_dir: Option<PathBuf>,
    /// Window capacity override.
    window_capacity: Option<usize>,
}

impl RelayBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the overlay page URL (required).
    #[inline]
    #[must_use]
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Overrides the socket endpoint.
    #[inline]
    #[must_use]
    pub fn socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = Some(url.into());
        self
    }

    /// Overrides the log data directory.
    #[inline]
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Overrides the rolling-window capacity.
    #[inline]
    #[must_use]
    pub fn window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = Some(capacity);
        self
    }

    /// Builds the relay with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the source URL is missing or invalid
    /// - [`Error::Persistence`] if the log directory cannot be initialized
    pub fn build(self) -> Result<Relay> {
        let source_url = self.source_url.ok_or_else(|| {
            Error::config(
                "source URL is required. Use .source_url() to set it.\n\
                 Example: Relay::builder().source_url(\"https://app.hyperate.io/overlay?id=abc123\")",
            )
        })?;

        let mut config = Config::new(source_url);
        if let Some(socket_url) = self.socket_url {
            config.socket_url = socket_url;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(capacity) = self.window_capacity {
            config.window_capacity = capacity;
        }

        Relay::new(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
