//! Sample fan-out.
//!
//! Two layers live here:
//!
//! - [`Dispatcher`] publishes every accepted sample onto a broadcast
//!   channel; overlay/OSD collaborators subscribe independently and
//!   receive their own stream. Publishing is fire-and-forget: a missing or
//!   lagging subscriber never blocks or fails ingestion.
//! - [`IngestPipeline`] is the full per-sample fan-out the session drives:
//!   aggregator, durable log, then dispatcher, in that order, one call per
//!   accepted sample.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::metrics::SampleAggregator;
use crate::sample::Sample;
use crate::storage::DailyLogWriter;

// ============================================================================
// Dispatcher
// ============================================================================

/// Fan-out of accepted samples to any number of subscribers.
///
/// Cloning is cheap and all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: broadcast::Sender<Sample>,
}

impl Dispatcher {
    /// Creates a dispatcher whose subscribers each buffer up to
    /// `capacity` samples. Slow subscribers skip ahead past anything they
    /// let overflow; they never slow down ingestion.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Hands out an independent receiver of all future samples.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Sample> {
        self.tx.subscribe()
    }

    /// Publishes one sample to all current subscribers.
    pub fn publish(&self, sample: &Sample) {
        if self.tx.send(sample.clone()).is_err() {
            trace!(bpm = sample.bpm, "sample published with no subscribers");
        }
    }

    /// Number of live subscribers.
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

// ============================================================================
// IngestPipeline
// ============================================================================

/// Ordered fan-out of one accepted sample to every sink.
///
/// Cloned into each session; all clones share the same window, log handle
/// and broadcast channel. The session's ingestion path is the only writer
/// of the log handle during streaming.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    aggregator: Arc<SampleAggregator>,
    log: Arc<Mutex<DailyLogWriter>>,
    dispatcher: Dispatcher,
}

impl IngestPipeline {
    /// Bundles the three sinks.
    #[must_use]
    pub fn new(
        aggregator: Arc<SampleAggregator>,
        log: Arc<Mutex<DailyLogWriter>>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            aggregator,
            log,
            dispatcher,
        }
    }

    /// Fans one sample out to the window, the durable log, and the
    /// subscribers, in that order.
    ///
    /// Persistence failures are logged and swallowed; durability is
    /// best-effort and never stops ingestion.
    pub fn ingest(&self, sample: Sample) {
        self.aggregator.add(sample.clone());

        if let Err(e) = self.log.lock().append(&sample) {
            warn!(error = %e, bpm = sample.bpm, "sample not persisted");
        }

        self.dispatcher.publish(&sample);
    }

    /// Shared rolling window.
    #[inline]
    #[must_use]
    pub fn aggregator(&self) -> &SampleAggregator {
        &self.aggregator
    }

    /// Consumer-facing fan-out.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_in_publish_order() {
        let dispatcher = Dispatcher::new(16);
        let mut rx = dispatcher.subscribe();

        for bpm in [60, 70, 80] {
            dispatcher.publish(&Sample::at(bpm, bpm as f64));
        }

        assert_eq!(rx.recv().await.expect("recv").bpm, 60);
        assert_eq!(rx.recv().await.expect("recv").bpm, 70);
        assert_eq!(rx.recv().await.expect("recv").bpm, 80);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let dispatcher = Dispatcher::new(16);
        dispatcher.publish(&Sample::at(72, 0.0));
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_independent_subscribers() {
        let dispatcher = Dispatcher::new(16);
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();

        dispatcher.publish(&Sample::at(95, 0.0));

        assert_eq!(a.recv().await.expect("recv").bpm, 95);
        assert_eq!(b.recv().await.expect("recv").bpm, 95);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_never_blocks_publish() {
        let dispatcher = Dispatcher::new(2);
        let mut rx = dispatcher.subscribe();

        // Overflow the subscriber buffer; every publish still succeeds.
        for bpm in 0..10u32 {
            dispatcher.publish(&Sample::at(60 + bpm, bpm as f64));
        }

        // The slow reader observes a lag marker, then the retained tail.
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.expect("recv").bpm, 68);
    }

    #[tokio::test]
    async fn test_pipeline_fans_out_to_every_sink() {
        let dir = tempfile::tempdir().expect("tempdir");
        let aggregator = Arc::new(SampleAggregator::new(16));
        let log = Arc::new(Mutex::new(DailyLogWriter::new(dir.path()).expect("log")));
        let dispatcher = Dispatcher::new(16);
        let mut rx = dispatcher.subscribe();

        let pipeline = IngestPipeline::new(Arc::clone(&aggregator), Arc::clone(&log), dispatcher);
        pipeline.ingest(Sample::now(72));
        pipeline.ingest(Sample::now(75));

        // Window.
        let bpm: Vec<u32> = aggregator.all().iter().map(|s| s.bpm).collect();
        assert_eq!(bpm, vec![72, 75]);

        // Durable log: header plus two rows.
        let path = log.lock().current_path().expect("path");
        let content = std::fs::read_to_string(path).expect("read log");
        assert_eq!(content.lines().count(), 3);

        // Subscribers, in order.
        assert_eq!(rx.recv().await.expect("recv").bpm, 72);
        assert_eq!(rx.recv().await.expect("recv").bpm, 75);
    }
}
