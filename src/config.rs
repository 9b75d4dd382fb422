//! Immutable per-session configuration.
//!
//! Configuration is constructed once and shared read-only (`Arc<Config>`)
//! with the supervisor; applying new settings means building a new struct
//! and letting the supervisor pick it up on the next session, never mutating
//! shared state in place.
//!
//! The one fatal startup condition lives here: an unset or placeholder
//! source URL fails [`Config::validate`] before the supervisor starts.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable carrying the overlay page URL.
pub const ENV_SOURCE_URL: &str = "HYPERATE_URL";

/// Environment variable overriding the log data directory.
pub const ENV_DATA_DIR: &str = "HEART_RATE_DATA_DIR";

/// Default socket endpoint for the streaming service.
pub const DEFAULT_SOCKET_URL: &str = "wss://app.hyperate.io/socket/websocket";

/// Default directory for per-day log files.
pub const DEFAULT_DATA_DIR: &str = "heart_rate_data";

/// Default rolling-window capacity.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10_000;

/// Fallback channel identifier when the source URL carries no `id` parameter.
pub const DEFAULT_CHANNEL_ID: &str = "internal-testing";

/// Marker left in template configs; treated as "not configured".
const PLACEHOLDER_MARKER: &str = "your-session-id";

// ============================================================================
// Config
// ============================================================================

/// Immutable configuration for one supervisor lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Overlay page URL carrying the embedded websocket key and the `id`
    /// query parameter identifying the channel.
    pub source_url: String,

    /// Socket endpoint; the resolved key is appended as `?token=<key>`.
    pub socket_url: String,

    /// Directory for per-day CSV log files.
    pub data_dir: PathBuf,

    /// Rolling-window capacity (FIFO eviction beyond this).
    pub window_capacity: usize,

    /// Interval between outbound heartbeat frames.
    pub heartbeat_interval: Duration,

    /// Fixed delay between reconnect attempts.
    pub retry_delay: Duration,

    /// Timeout for the key-resolution HTTP request.
    pub resolve_timeout: Duration,

    /// Capacity of the sample fan-out channel.
    pub dispatch_capacity: usize,
}

impl Config {
    /// Creates a configuration with defaults for everything but the
    /// source URL.
    #[must_use]
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            heartbeat_interval: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
            resolve_timeout: Duration::from_secs(10),
            dispatch_capacity: 64,
        }
    }

    /// Loads configuration from the process environment.
    ///
    /// Reads `HYPERATE_URL` (required) and `HEART_RATE_DATA_DIR` (optional).
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `HYPERATE_URL` is unset or invalid
    pub fn from_env() -> Result<Self> {
        let source_url = std::env::var(ENV_SOURCE_URL).map_err(|_| {
            Error::config(format!(
                "{ENV_SOURCE_URL} environment variable is not set.\n\
                 Set it to your overlay page URL, e.g.\n\
                 {ENV_SOURCE_URL}=https://app.hyperate.io/overlay?id=abc123"
            ))
        })?;

        let mut config = Self::new(source_url);
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the startup preconditions.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the source URL is empty, a template
    ///   placeholder, or not a parseable URL
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(Error::config(format!(
                "source URL is empty. Set {ENV_SOURCE_URL} to your overlay page URL."
            )));
        }

        if self.source_url.contains(PLACEHOLDER_MARKER) {
            return Err(Error::config(
                "source URL still contains the template placeholder. \
                 Replace it with your real overlay link.",
            ));
        }

        if Url::parse(&self.source_url).is_err() {
            return Err(Error::config(format!(
                "source URL is not a valid URL: {}",
                self.source_url
            )));
        }

        Ok(())
    }

    /// Channel identifier derived from the source URL's `id` parameter.
    ///
    /// Falls back to [`DEFAULT_CHANNEL_ID`] when the parameter is absent or
    /// empty, so the join frame is always well-formed.
    #[must_use]
    pub fn channel_id(&self) -> String {
        extract_channel_id(&self.source_url)
    }
}

// ============================================================================
// Channel Identity
// ============================================================================

/// Extracts the channel identifier from a source URL's `id` query parameter.
#[must_use]
pub fn extract_channel_id(source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string())
}

// ============================================================================
// Tests
// ============================================================================
