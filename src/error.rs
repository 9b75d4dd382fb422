//! Error types for the heart-rate ingestion core.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use pulse_relay::{Result, Relay};
//!
//! async fn example(relay: &Relay) -> Result<()> {
//!     relay.clear()?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | Configuration | [`Error::Config`] | fatal, checked before startup |
//! | Key resolution | [`Error::Resolution`] | session-fatal, supervisor retries |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] | session-fatal, supervisor retries |
//! | Decode | [`Error::Decode`] | local, frame dropped |
//! | Persistence | [`Error::Persistence`] | local, logged and swallowed |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`] | context-dependent |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the source URL is unset, a placeholder, or otherwise
    /// invalid. This is the one fatal, process-terminating condition and is
    /// checked before the supervisor starts.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Key Resolution Errors
    // ========================================================================
    /// Websocket key resolution failed.
    ///
    /// Returned when the key page cannot be fetched, the request times out,
    /// or the embedded key pattern is absent from the response body.
    #[error("Key resolution failed: {message}")]
    Resolution {
        /// Description of the resolution failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Socket connection failed.
    ///
    /// Returned when the socket cannot be opened or a read/write fails.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Socket connection closed.
    ///
    /// Returned when the remote closes the connection or the inbound
    /// stream ends mid-session.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Frame Errors
    // ========================================================================
    /// Malformed inbound frame.
    ///
    /// Recovered locally: the frame is dropped and streaming continues.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// Durable log write or rotation failed.
    ///
    /// Recovered locally: the ingestion path logs the failure and continues.
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description of the persistence failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a key resolution error.
    #[inline]
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a persistence error.
    #[inline]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error terminates the current session.
    ///
    /// Session-fatal errors are retried by the supervisor with a fresh
    /// session; they never terminate the process.
    #[inline]
    #[must_use]
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::Resolution { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
                | Self::Http(_)
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recovered locally.
    ///
    /// Locally recovered errors never tear down the session: a bad frame is
    /// dropped, a failed log write is logged and swallowed.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Persistence { .. })
    }

    /// Returns `true` if this error is fatal to the process.
    ///
    /// Only configuration precondition failures qualify.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("socket reset");
        assert_eq!(err.to_string(), "Connection failed: socket reset");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("source URL not set");
        assert_eq!(err.to_string(), "Configuration error: source URL not set");
    }

    #[test]
    fn test_resolution_error() {
        let err = Error::resolution("key pattern not found");
        assert_eq!(
            err.to_string(),
            "Key resolution failed: key pattern not found"
        );
    }

    #[test]
    fn test_is_session_fatal() {
        assert!(Error::resolution("x").is_session_fatal());
        assert!(Error::connection("x").is_session_fatal());
        assert!(Error::ConnectionClosed.is_session_fatal());
        assert!(!Error::decode("x").is_session_fatal());
        assert!(!Error::config("x").is_session_fatal());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("x").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::resolution("x").is_connection_error());
        assert!(!Error::persistence("x").is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::decode("bad frame").is_recoverable());
        assert!(Error::persistence("disk full").is_recoverable());
        assert!(!Error::connection("x").is_recoverable());
        assert!(!Error::config("x").is_recoverable());
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::config("placeholder URL").is_fatal());
        assert!(!Error::ConnectionClosed.is_fatal());
        assert!(!Error::persistence("x").is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
