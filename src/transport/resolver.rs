//! Websocket key resolution.
//!
//! The streaming service embeds a short-lived connection token in its
//! overlay page. [`KeyResolver`] fetches the page and extracts the token
//! by pattern match. No retry lives here: a failed resolution fails the
//! current session and the supervisor tries again on its fixed cadence.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Generic user agent; the key page refuses obvious bot agents.
const USER_AGENT: &str = "Mozilla/5.0";

/// `websocketKey = '<token>'`, either quote style, flexible whitespace.
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"websocketKey\s*=\s*['"]([^'"]+)['"]"#).expect("key pattern compiles")
});

// ============================================================================
// KeyResolver
// ============================================================================

/// Fetches the overlay page and extracts the embedded websocket key.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    client: reqwest::Client,
}

impl KeyResolver {
    /// Creates a resolver whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::resolution(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetches `url` and extracts the websocket key from the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] when the request fails, times out,
    /// returns a non-success status, or the key pattern is absent.
    pub async fn resolve(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::resolution(format!("request to {url} failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::resolution(format!("key page returned an error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::resolution(format!("failed to read key page body: {e}")))?;

        let key = extract_key(&body)
            .ok_or_else(|| Error::resolution("websocketKey not found in page body"))?;

        debug!(key_len = key.len(), "websocket key resolved");
        Ok(key.to_string())
    }
}

// ============================================================================
// Key Extraction
// ============================================================================

/// Extracts the embedded websocket key from a page body, if present.
#[must_use]
pub fn extract_key(body: &str) -> Option<&str> {
    KEY_PATTERN
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

// ============================================================================
// Tests
// ============================================================================
