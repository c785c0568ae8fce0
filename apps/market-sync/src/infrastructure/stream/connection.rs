//! Stream Connection Manager
//!
//! Owns one WebSocket connection's lifecycle and reconnection policy.
//! `connect` returns immediately; the connection task transitions through
//! `Connecting -> Open` (or `Closed` on failure), publishes every
//! transition as a `ConnectionStateChanged` event, and sends the
//! subscribe frame once upon open.
//!
//! Transport-level failures of any flavor (refused connection, abrupt
//! close, handshake error) are all normalized to a `Closed` transition;
//! callers only observe the reconnection counter. An unplanned close
//! triggers fixed-interval reconnection until the policy is exhausted,
//! after which exactly one `ReconnectExhausted` event is raised and the
//! connection stays `Closed` until `connect` is called again. `disconnect`
//! cancels any pending reconnect timer.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::codec::{DecodeError, JsonCodec};
use super::raw::RawMessageBuffer;
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use crate::application::services::MarketSyncService;
use crate::domain::events::{ConnectionState, MarketEvent};

/// Outbound frame channel capacity.
const OUTBOUND_CAPACITY: usize = 64;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the stream connection.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// `send` was called while the connection is not `Open`.
    #[error("not connected")]
    NotConnected,

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Frame codec failure.
    #[error("codec error: {0}")]
    Codec(#[from] DecodeError),

    /// Outbound channel is full or closed.
    #[error("outbound channel send failed")]
    ChannelSend,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the stream connection.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL of the multiplexed feed.
    pub url: String,
    /// Reconnection policy configuration.
    pub reconnect: ReconnectConfig,
}

impl StreamConfig {
    /// Create a configuration with the default reconnect policy.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

// =============================================================================
// Connection Manager
// =============================================================================

/// Manages one WebSocket connection to the market feed.
///
/// Inbound frames are appended to the raw-message ring buffer, decoded,
/// and routed through the sync service; decode failures are logged and
/// dropped without touching the store.
pub struct StreamConnection {
    config: StreamConfig,
    codec: JsonCodec,
    sync: Arc<MarketSyncService>,
    state: RwLock<ConnectionState>,
    raw: Arc<RawMessageBuffer>,
    outbound: RwLock<Option<mpsc::Sender<Message>>>,
    cancel: RwLock<CancellationToken>,
}

impl StreamConnection {
    /// Create a new connection manager. No connection is attempted until
    /// `connect` is called.
    #[must_use]
    pub fn new(config: StreamConfig, sync: Arc<MarketSyncService>) -> Self {
        Self {
            config,
            codec: JsonCodec::new(),
            sync,
            state: RwLock::new(ConnectionState::Uninitialized),
            raw: Arc::new(RawMessageBuffer::default()),
            outbound: RwLock::new(None),
            cancel: RwLock::new(CancellationToken::new()),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// The diagnostic ring buffer of recent inbound frames.
    #[must_use]
    pub fn raw_messages(&self) -> &Arc<RawMessageBuffer> {
        &self.raw
    }

    /// Establish the connection. Returns immediately; progress is
    /// observable through `ConnectionStateChanged` events and `state`.
    ///
    /// Calling `connect` while already connecting or open is a no-op.
    pub fn connect(self: &Arc<Self>) {
        {
            let state = self.state();
            if matches!(state, ConnectionState::Connecting | ConnectionState::Open) {
                tracing::warn!(state = state.as_str(), "connect called while already active");
                return;
            }
        }

        let cancel = CancellationToken::new();
        *self.cancel.write() = cancel.clone();

        self.set_state(ConnectionState::Connecting);
        tokio::spawn(Arc::clone(self).run(cancel));
    }

    /// Tear the connection down and cancel any pending reconnect timer.
    /// No reconnection occurs until `connect` is called again.
    pub fn disconnect(&self) {
        self.cancel.read().cancel();
        *self.outbound.write() = None;

        self.set_state(ConnectionState::Closing);
        self.set_state(ConnectionState::Closed);
    }

    /// Send a raw frame over the connection.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::NotConnected` when the state is not `Open`,
    /// or `StreamError::ChannelSend` if the outbound channel rejects the
    /// frame.
    pub fn send(&self, frame: &str) -> Result<(), StreamError> {
        if self.state() != ConnectionState::Open {
            return Err(StreamError::NotConnected);
        }

        let sender = self.outbound.read().clone().ok_or(StreamError::NotConnected)?;
        sender
            .try_send(Message::Text(frame.to_string().into()))
            .map_err(|_| StreamError::ChannelSend)
    }

    /// Connection task: connect, process frames, reconnect on unplanned
    /// close until cancelled or the policy is exhausted.
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if cancel.is_cancelled() {
                return;
            }

            match self.connect_once(&cancel, &mut policy).await {
                Ok(()) => {
                    tracing::info!("Stream connection cancelled");
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stream connection error");
                    *self.outbound.write() = None;
                    self.set_state(ConnectionState::Closed);

                    if let Some(delay) = policy.next_delay() {
                        tracing::info!(
                            attempt = policy.attempts_used(),
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "Reconnecting to market stream"
                        );

                        tokio::select! {
                            () = cancel.cancelled() => {
                                tracing::info!("Stream connection cancelled during reconnect delay");
                                return;
                            }
                            () = tokio::time::sleep(delay) => {}
                        }

                        self.set_state(ConnectionState::Connecting);
                    } else {
                        if policy.is_exhausted() {
                            self.sync.apply(MarketEvent::ReconnectExhausted {
                                attempts: policy.attempts_used(),
                            });
                        }
                        return;
                    }
                }
            }
        }
    }

    /// One connection attempt: open, subscribe, process frames until an
    /// error or cancellation. Returns `Ok` only when cancelled.
    async fn connect_once(
        &self,
        cancel: &CancellationToken,
        policy: &mut ReconnectPolicy,
    ) -> Result<(), StreamError> {
        tracing::info!(url = %self.config.url, "Connecting to market stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url)
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);
        *self.outbound.write() = Some(outbound_tx);
        self.set_state(ConnectionState::Open);
        policy.reset();

        // Single multiplexed feed: one subscribe frame upon open.
        let subscribe = self.codec.subscribe_frame()?;
        write
            .send(Message::Text(subscribe.into()))
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    *self.outbound.write() = None;
                    return Ok(());
                }
                frame = outbound_rx.recv() => {
                    if let Some(frame) = frame {
                        write
                            .send(frame)
                            .await
                            .map_err(|e| StreamError::Transport(e.to_string()))?;
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.raw.push(text.to_string());

                            match self.codec.decode(text.as_str()) {
                                Ok(event) => self.sync.apply(event),
                                Err(e) => {
                                    tracing::warn!(error = %e, "Dropping undecodable frame");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write
                                .send(Message::Pong(data))
                                .await
                                .map_err(|e| StreamError::Transport(e.to_string()))?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            return Err(StreamError::Transport("server closed connection".to_string()));
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types.
                        }
                        Some(Err(e)) => {
                            return Err(StreamError::Transport(e.to_string()));
                        }
                        None => {
                            return Err(StreamError::Transport("stream ended".to_string()));
                        }
                    }
                }
            }
        }
    }

    /// Transition the connection state, publishing the change. No-op
    /// transitions are suppressed.
    fn set_state(&self, next: ConnectionState) {
        let previous = {
            let mut state = self.state.write();
            let previous = *state;
            if previous == next {
                return;
            }
            *state = next;
            previous
        };

        self.sync.apply(MarketEvent::ConnectionStateChanged {
            previous,
            current: next,
        });
    }
}
