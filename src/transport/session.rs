//! One socket connection lifetime.
//!
//! A [`ChannelSession`] owns exactly one connection: key resolution, the
//! join handshake, the heartbeat timer, inbound frame decode, and the
//! fan-out of accepted samples. Any failure tears the session down and
//! control returns to the supervisor, which builds a fresh session.
//!
//! # State Machine
//!
//! ```text
//! Disconnected --resolve key--> ResolvingKey --success--> Connecting
//! Connecting --socket opens--> Joined (send join frame, topic "hr:<channelId>")
//! Joined --immediately--> Streaming (start heartbeat task)
//! Streaming --frame received--> Streaming (decode, fan out)
//! Streaming --socket error | heartbeat send failure--> Closing --> Disconnected
//! ResolvingKey --failure--> Disconnected
//! Connecting --failure--> Disconnected
//! ```
//!
//! Malformed or non-sample frames are dropped silently; they are not
//! connection errors and streaming continues.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::dispatch::IngestPipeline;
use crate::error::{Error, Result};
use crate::protocol::{InboundFrame, OutboundFrame, RefSeq};
use crate::sample::Sample;
use crate::transport::resolver::KeyResolver;

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection; the initial and terminal state of every session.
    Disconnected,
    /// Fetching the websocket key from the overlay page.
    ResolvingKey,
    /// Opening the socket.
    Connecting,
    /// Socket open, join frame sent.
    Joined,
    /// Receiving frames, heartbeat running.
    Streaming,
    /// Tearing down after a failure.
    Closing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::ResolvingKey => "resolving-key",
            Self::Connecting => "connecting",
            Self::Joined => "joined",
            Self::Streaming => "streaming",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ChannelSession
// ============================================================================

/// One connection to the streaming service.
pub struct ChannelSession {
    /// Shared, immutable configuration.
    config: Arc<Config>,
    /// Per-sample fan-out.
    pipeline: IngestPipeline,
    /// Current lifecycle state.
    state: SessionState,
    /// Monotonic outbound frame counter.
    refs: RefSeq,
}

impl ChannelSession {
    /// Creates a session in the `Disconnected` state.
    #[must_use]
    pub fn new(config: Arc<Config>, pipeline: IngestPipeline) -> Self {
        Self {
            config,
            pipeline,
            state: SessionState::Disconnected,
            refs: RefSeq::new(),
        }
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to completion: resolve key, connect, join, stream.
    ///
    /// Always ends back in `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns the failure that terminated the session; the supervisor
    /// retries with a fresh session.
    pub async fn run(&mut self) -> Result<()> {
        self.transition(SessionState::ResolvingKey);

        let key = match self.resolve_key().await {
            Ok(key) => key,
            Err(e) => {
                self.transition(SessionState::Disconnected);
                return Err(e);
            }
        };

        self.stream_with_key(&key).await
    }

    /// Connects with an already-resolved key and streams until failure.
    ///
    /// Always ends back in `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns the failure that terminated the session.
    pub async fn stream_with_key(&mut self, key: &str) -> Result<()> {
        let result = self.stream_inner(key).await;
        self.transition(SessionState::Disconnected);
        result
    }

    /// Fetches the short-lived connection key.
    async fn resolve_key(&self) -> Result<String> {
        let resolver = KeyResolver::new(self.config.resolve_timeout)?;
        resolver.resolve(&self.config.source_url).await
    }

    /// Connect, join, heartbeat, receive loop.
    async fn stream_inner(&mut self, key: &str) -> Result<()> {
        self.transition(SessionState::Connecting);

        let ws_url = format!("{}?token={key}", self.config.socket_url);
        let (stream, _) = connect_async(ws_url.as_str()).await?;
        let (mut ws_write, mut ws_read) = stream.split();

        self.transition(SessionState::Joined);

        let channel_id = self.config.channel_id();
        let join = OutboundFrame::join(&channel_id, self.refs.next());
        ws_write.send(Message::Text(join.to_wire()?.into())).await?;
        info!(channel = %channel_id, "joined channel");

        self.transition(SessionState::Streaming);

        // Heartbeat task: owns the timer only; the event loop performs the
        // write so the ref counter stays monotonic across frame kinds.
        let (tick_tx, mut tick_rx) = mpsc::channel::<()>(1);
        let heartbeat_interval = self.config.heartbeat_interval;
        let heartbeat = tokio::spawn(async move {
            let mut timer = interval(heartbeat_interval);
            loop {
                timer.tick().await;
                if tick_tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        let result = loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()),

                        Some(Ok(Message::Close(_))) => {
                            debug!("socket closed by remote");
                            break Err(Error::ConnectionClosed);
                        }

                        Some(Err(e)) => {
                            break Err(e.into());
                        }

                        None => {
                            debug!("socket stream ended");
                            break Err(Error::ConnectionClosed);
                        }

                        // Ignore Binary, Ping, Pong
                        Some(Ok(_)) => {}
                    }
                }

                tick = tick_rx.recv() => {
                    if tick.is_none() {
                        break Err(Error::connection("heartbeat timer stopped"));
                    }

                    let frame = OutboundFrame::heartbeat(self.refs.next());
                    let wire = match frame.to_wire() {
                        Ok(wire) => wire,
                        Err(e) => break Err(e),
                    };

                    trace!(reference = frame.reference, "heartbeat");
                    if let Err(e) = ws_write.send(Message::Text(wire.into())).await {
                        warn!(error = %e, "heartbeat send failed");
                        break Err(e.into());
                    }
                }
            }
        };

        // The heartbeat task must be gone before the supervisor builds the
        // next attempt; a stale writer must never touch a new session.
        self.transition(SessionState::Closing);
        heartbeat.abort();
        let _ = heartbeat.await;
        let _ = ws_write.close().await;

        result
    }

    /// Decodes one inbound text frame and fans out the sample, if any.
    ///
    /// Malformed and non-sample frames are dropped silently.
    fn handle_frame(&mut self, text: &str) {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                trace!(error = %e, "dropped malformed frame");
                return;
            }
        };

        let Some(bpm) = frame.bpm() else {
            trace!(
                event = frame.event.as_deref().unwrap_or_default(),
                "ignored non-sample frame"
            );
            return;
        };

        let sample = Sample::now(bpm);
        trace!(bpm, "sample accepted");
        self.pipeline.ingest(sample);
    }

    /// Records a state transition.
    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "session state");
        self.state = next;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use crate::dispatch::Dispatcher;
    use crate::metrics::SampleAggregator;
    use crate::storage::DailyLogWriter;

    fn test_pipeline(data_dir: &Path) -> (IngestPipeline, Arc<SampleAggregator>, Dispatcher) {
        let aggregator = Arc::new(SampleAggregator::new(100));
        let log = Arc::new(Mutex::new(DailyLogWriter::new(data_dir).expect("log")));
        let dispatcher = Dispatcher::new(16);
        let pipeline = IngestPipeline::new(
            Arc::clone(&aggregator),
            log,
            dispatcher.clone(),
        );
        (pipeline, aggregator, dispatcher)
    }

    fn test_config(socket_addr: &str, heartbeat: Duration) -> Arc<Config> {
        let mut config = Config::new("https://example.com/overlay?id=test-channel");
        config.socket_url = format!("ws://{socket_addr}/socket/websocket");
        config.heartbeat_interval = heartbeat;
        Arc::new(config)
    }

    #[tokio::test]
    async fn test_streaming_survives_garbage_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("handshake");

            // First inbound frame is the join.
            let join = ws.next().await.expect("join frame").expect("join ok");
            let join_text = join.into_text().expect("text").as_str().to_string();

            for frame in [
                r#"{"topic":"hr:test-channel","event":"hr_update","payload":{"hr":72}}"#,
                "definitely not json",
                r#"{"event":"phx_reply","payload":{"status":"ok"}}"#,
                r#"{"topic":"hr:test-channel","event":"hr_update","payload":{"hr":"80"}}"#,
            ] {
                ws.send(Message::Text(frame.into())).await.expect("send");
            }

            ws.close(None).await.expect("close");
            join_text
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let (pipeline, aggregator, dispatcher) = test_pipeline(dir.path());
        let mut rx = dispatcher.subscribe();

        let mut session = ChannelSession::new(
            test_config(&addr, Duration::from_secs(30)),
            pipeline,
        );

        let err = session.stream_with_key("dummy-key").await.unwrap_err();
        assert!(err.is_connection_error());
        assert_eq!(session.state(), SessionState::Disconnected);

        // Join handshake was well-formed.
        let join_text = server.await.expect("server");
        let join: serde_json::Value = serde_json::from_str(&join_text).expect("join json");
        assert_eq!(join["topic"], "hr:test-channel");
        assert_eq!(join["event"], "phx_join");
        assert_eq!(join["ref"], 1);

        // Both valid samples were accepted, in wire order; the garbage and
        // the non-sample frame were dropped without killing the session.
        let bpm: Vec<u32> = aggregator.all().iter().map(|s| s.bpm).collect();
        assert_eq!(bpm, vec![72, 80]);

        assert_eq!(rx.recv().await.expect("recv").bpm, 72);
        assert_eq!(rx.recv().await.expect("recv").bpm, 80);
    }

    #[tokio::test]
    async fn test_heartbeats_are_periodic_and_monotonic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("handshake");

            let mut frames = Vec::new();
            // Join plus two heartbeats (first fires immediately).
            for _ in 0..3 {
                let message = ws.next().await.expect("frame").expect("frame ok");
                frames.push(message.into_text().expect("text").as_str().to_string());
            }

            ws.close(None).await.expect("close");
            frames
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let (pipeline, _aggregator, _dispatcher) = test_pipeline(dir.path());

        let mut session = ChannelSession::new(
            test_config(&addr, Duration::from_millis(100)),
            pipeline,
        );

        let _ = session.stream_with_key("dummy-key").await;

        let frames = server.await.expect("server");
        let parsed: Vec<serde_json::Value> = frames
            .iter()
            .map(|f| serde_json::from_str(f).expect("json"))
            .collect();

        assert_eq!(parsed[0]["event"], "phx_join");
        assert_eq!(parsed[1]["topic"], "phoenix");
        assert_eq!(parsed[1]["event"], "heartbeat");
        assert_eq!(parsed[2]["event"], "heartbeat");

        // One ref sequence across join and heartbeats.
        assert_eq!(parsed[0]["ref"], 1);
        assert_eq!(parsed[1]["ref"], 2);
        assert_eq!(parsed[2]["ref"], 3);
    }

    #[tokio::test]
    async fn test_connect_failure_returns_to_disconnected() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        drop(listener);

        let dir = tempfile::tempdir().expect("tempdir");
        let (pipeline, aggregator, _dispatcher) = test_pipeline(dir.path());

        let mut session = ChannelSession::new(
            test_config(&addr, Duration::from_secs(30)),
            pipeline,
        );

        let err = session.stream_with_key("dummy-key").await.unwrap_err();
        assert!(err.is_session_fatal());
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(aggregator.is_empty());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Disconnected.to_string(), "disconnected");
        assert_eq!(SessionState::ResolvingKey.to_string(), "resolving-key");
        assert_eq!(SessionState::Streaming.to_string(), "streaming");
    }
}
