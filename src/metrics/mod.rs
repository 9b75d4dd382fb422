//! In-memory sample window and derived statistics.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `window` | Bounded FIFO window, [`SampleAggregator`] |
//! | `stats` | Pure statistics computation, [`StatsSnapshot`] |

// ============================================================================
// Submodules
// ============================================================================

/// Bounded rolling window of recent samples.
pub mod window;

/// Derived statistics over a sample snapshot.
pub mod stats;

// ============================================================================
// Re-exports
// ============================================================================

pub use stats::{
    RangeBuckets, StatsSnapshot, TREND_WINDOW, Trend, TrendLabel, compute_stats,
    least_squares_slope,
};
pub use window::SampleAggregator;
