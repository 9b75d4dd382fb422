//! Outbound and inbound frame types.
//!
//! Defines the JSON text frames exchanged with the streaming service and
//! the decode path for inbound sample frames.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Event name for joining a channel.
const EVENT_JOIN: &str = "phx_join";

/// Event name for the keep-alive heartbeat.
const EVENT_HEARTBEAT: &str = "heartbeat";

/// Topic addressed by heartbeat frames.
const TOPIC_HEARTBEAT: &str = "phoenix";

// ============================================================================
// OutboundFrame
// ============================================================================

/// A frame sent from this client to the service.
///
/// # Format
///
/// ```json
/// {
///   "topic": "hr:<channelId>",
///   "event": "phx_join",
///   "payload": {},
///   "ref": 1
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    /// Channel topic, e.g. `hr:<channelId>` or `phoenix`.
    pub topic: String,

    /// Event name, e.g. `phx_join` or `heartbeat`.
    pub event: String,

    /// Event payload; always an empty object for outbound frames.
    pub payload: Value,

    /// Monotonic per-session frame counter.
    #[serde(rename = "ref")]
    pub reference: u64,
}

impl OutboundFrame {
    /// Creates a join frame for the given channel.
    #[must_use]
    pub fn join(channel_id: &str, reference: u64) -> Self {
        Self {
            topic: format!("hr:{channel_id}"),
            event: EVENT_JOIN.to_string(),
            payload: Value::Object(serde_json::Map::new()),
            reference,
        }
    }

    /// Creates a heartbeat frame.
    #[must_use]
    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: TOPIC_HEARTBEAT.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: Value::Object(serde_json::Map::new()),
            reference,
        }
    }

    /// Serializes the frame to its wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on serialization failure.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// RefSeq
// ============================================================================

/// Monotonically increasing reference counter, shared across all outbound
/// frames of one session. Starts at 1.
#[derive(Debug)]
pub struct RefSeq {
    next: u64,
}

impl RefSeq {
    /// Creates a counter starting at 1.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next reference and advances the counter.
    #[inline]
    pub fn next(&mut self) -> u64 {
        let reference = self.next;
        self.next += 1;
        reference
    }
}

impl Default for RefSeq {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// InboundFrame
// ============================================================================

/// A frame received from the service.
///
/// Any JSON object carrying a numeric (or numeric-string) `payload.hr` is a
/// sample; every other shape is ignored by the session.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    /// Channel topic, when present.
    #[serde(default)]
    pub topic: Option<String>,

    /// Event name, when present.
    #[serde(default)]
    pub event: Option<String>,

    /// Raw payload, when present.
    #[serde(default)]
    pub payload: Option<Value>,
}

impl InboundFrame {
    /// Parses a wire text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed (non-JSON-object) text.
    /// The session drops such frames silently and keeps streaming.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::decode(e.to_string()))
    }

    /// Extracts the heart-rate value, if this frame carries one.
    ///
    /// Accepts integers, finite non-negative floats (truncated toward
    /// zero), and numeric strings. Everything else yields `None`.
    #[must_use]
    pub fn bpm(&self) -> Option<u32> {
        let hr = self.payload.as_ref()?.get("hr")?;
        numeric_bpm(hr)
    }
}

/// Coerces a JSON value into an integer BPM.
fn numeric_bpm(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    if let Some(f) = value.as_f64() {
        return float_bpm(f);
    }
    if let Some(s) = value.as_str() {
        let s = s.trim();
        if let Ok(n) = s.parse::<u32>() {
            return Some(n);
        }
        if let Ok(f) = s.parse::<f64>() {
            return float_bpm(f);
        }
    }
    None
}

/// Truncates a finite, in-range float toward zero.
fn float_bpm(value: f64) -> Option<u32> {
    (value.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&value)).then_some(value as u32)
}

// ============================================================================
// Tests
// ============================================================================
