//! Wire protocol frame types.
//!
//! This module defines the JSON text frames exchanged over the persistent
//! socket connection with the streaming service.
//!
//! # Protocol Overview
//!
//! | Frame | Direction | Purpose |
//! |-------|-----------|---------|
//! | join (`phx_join`) | Client → Service | Subscribe to `hr:<channelId>` |
//! | heartbeat | Client → Service | Keep-alive, every 30 s |
//! | sample (`payload.hr`) | Service → Client | One heart-rate reading |
//!
//! The `ref` field is a monotonically increasing integer shared across all
//! outbound frames on one session ([`RefSeq`]). Inbound frames that are not
//! JSON objects carrying a numeric `payload.hr` are ignored.

// ============================================================================
// Submodules
// ============================================================================

/// Frame definitions and inbound decode.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{InboundFrame, OutboundFrame, RefSeq};
