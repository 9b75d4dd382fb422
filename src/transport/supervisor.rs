//! Session supervision and reconnection.
//!
//! The supervisor owns the whole connection lifetime: build a session, run
//! it to completion, log the failure, sleep the fixed retry delay, repeat.
//! This is the system's sole retry policy — unconditional, infinite,
//! fixed-delay. No backoff, no circuit breaker, no giving up: the consuming
//! overlay has no failure state to show, so silent eventual reconnection is
//! the contract. Every attempt resolves a fresh key.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dispatch::IngestPipeline;
use crate::transport::session::ChannelSession;

// ============================================================================
// ConnectionManager
// ============================================================================

/// Supervises one [`ChannelSession`] at a time, forever.
pub struct ConnectionManager {
    /// Shared, immutable configuration.
    config: Arc<Config>,
    /// Sinks handed to every session.
    pipeline: IngestPipeline,
}

impl ConnectionManager {
    /// Creates a supervisor over the given sinks.
    #[must_use]
    pub fn new(config: Arc<Config>, pipeline: IngestPipeline) -> Self {
        Self { config, pipeline }
    }

    /// Runs sessions forever; never returns under normal operation.
    ///
    /// Exactly one session is active at any time. A session ending for any
    /// reason is logged and followed by the fixed retry delay before the
    /// next attempt starts with a newly resolved key.
    pub async fn run(self) {
        info!(
            channel = %self.config.channel_id(),
            retry_delay = ?self.config.retry_delay,
            "connection supervisor started"
        );

        loop {
            let mut session =
                ChannelSession::new(Arc::clone(&self.config), self.pipeline.clone());

            match session.run().await {
                Ok(()) => warn!("session ended without an error; reconnecting"),
                Err(e) => warn!(error = %e, "session terminated"),
            }

            debug!(delay = ?self.config.retry_delay, "waiting before reconnect");
            sleep(self.config.retry_delay).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
