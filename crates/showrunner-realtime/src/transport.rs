//! Transport channel
//!
//! One shared, reconnecting, bidirectional connection to the backend's realtime
//! endpoint. A supervisor task owns the connection: it performs the handshake,
//! forwards inbound `progress`/`status` events to the [`SubscriptionRegistry`],
//! and retries a bounded number of times with a fixed delay when the handshake
//! fails. Connection failures never surface as errors to callers; the channel
//! simply reports itself disconnected.

use crate::config::RealtimeConfig;
use crate::error::{Error, Result};
use crate::protocol::{ClientFrame, ServerFrame};
use crate::registry::SubscriptionRegistry;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// An established connection, seen as a pair of frame channels.
///
/// The connection is considered closed once the outbound receiver is gone or
/// the inbound sender is dropped.
#[derive(Debug)]
pub struct Connection {
    /// Frames to send to the backend
    pub outbound: mpsc::Sender<ClientFrame>,
    /// Frames received from the backend
    pub inbound: mpsc::Receiver<ServerFrame>,
}

/// Opens realtime connections
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    /// Perform the handshake with `url`
    async fn connect(&self, url: &str) -> Result<Connection>;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket connector backed by `tokio-tungstenite`
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    buffer: usize,
}

impl TungsteniteConnector {
    /// Create a connector with `buffer` frames of slack in each direction
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
        }
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Normalize an endpoint URL to a websocket scheme
pub fn websocket_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(Error::InvalidUrl(format!("unsupported scheme: {other}"))),
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|()| Error::InvalidUrl(format!("cannot use scheme {scheme} for {raw}")))?;
    }
    Ok(url)
}

#[async_trait]
impl RealtimeConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Connection> {
        let url = websocket_url(url)?;
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;

        let (write, read) = ws_stream.split();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.buffer);
        let (inbound_tx, inbound_rx) = mpsc::channel(self.buffer);

        tokio::spawn(write_frames(write, outbound_rx));
        tokio::spawn(read_frames(read, inbound_tx));

        Ok(Connection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

async fn write_frames(
    mut write: futures_util::stream::SplitSink<WsStream, Message>,
    mut outbound: mpsc::Receiver<ClientFrame>,
) {
    while let Some(frame) = outbound.recv().await {
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to encode realtime frame");
                continue;
            }
        };
        if let Err(e) = write.send(Message::Text(text)).await {
            warn!(error = %e, "Failed to send realtime frame");
            return;
        }
    }
    let _ = write.send(Message::Close(None)).await;
}

async fn read_frames(
    mut read: futures_util::stream::SplitStream<WsStream>,
    inbound: mpsc::Sender<ServerFrame>,
) {
    loop {
        let message = tokio::select! {
            () = inbound.closed() => break,
            message = read.next() => message,
        };
        match message {
            Some(Ok(Message::Text(text))) => match ServerFrame::decode(&text) {
                Ok(frame) => {
                    if inbound.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(e) => debug!(error = %e, "Skipping malformed realtime frame"),
            },
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "Realtime socket error");
                break;
            }
        }
    }
}

type OutboundSlot = Arc<Mutex<Option<mpsc::Sender<ClientFrame>>>>;

/// One supervisor run; a fresh slot per session so a stale supervisor never
/// clears a newer session's sender.
struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    outbound: OutboundSlot,
}

/// Shared realtime connection
pub struct TransportChannel {
    config: RealtimeConfig,
    connector: Arc<dyn RealtimeConnector>,
    registry: SubscriptionRegistry,
    session: Mutex<Option<Session>>,
}

impl std::fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportChannel")
            .field("url", &self.config.url)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl TransportChannel {
    /// Create a disconnected channel that dispatches into `registry`
    #[must_use]
    pub fn new(
        config: RealtimeConfig,
        connector: Arc<dyn RealtimeConnector>,
        registry: SubscriptionRegistry,
    ) -> Self {
        Self {
            config,
            connector,
            registry,
            session: Mutex::new(None),
        }
    }

    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn outbound(&self) -> Option<mpsc::Sender<ClientFrame>> {
        let slot = self.session().as_ref().map(|s| Arc::clone(&s.outbound))?;
        let tx = slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        tx
    }

    /// Start connecting. No-op while a connection is live or being attempted.
    ///
    /// Needs a Tokio runtime; outside one the call is logged and ignored.
    pub fn connect(&self) {
        let mut session = self.session();
        if session.as_ref().is_some_and(|s| !s.task.is_finished()) {
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No runtime available, realtime channel stays disconnected");
                return;
            }
        };

        let cancel = CancellationToken::new();
        let outbound: OutboundSlot = Arc::new(Mutex::new(None));
        let supervisor = Supervisor {
            url: self.config.url.clone(),
            attempts: self.config.reconnect_attempts,
            delay: self.config.reconnect_delay(),
            connector: Arc::clone(&self.connector),
            registry: self.registry.clone(),
            outbound: Arc::clone(&outbound),
            cancel: cancel.clone(),
        };
        let task = handle.spawn(supervisor.run());
        *session = Some(Session {
            cancel,
            task,
            outbound,
        });
    }

    /// Tear down the connection and clear the handle. Safe when disconnected.
    pub fn disconnect(&self) {
        let session = self.session().take();
        if let Some(session) = session {
            session.cancel.cancel();
            session
                .outbound
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take();
            debug!(url = %self.config.url, "Realtime channel torn down");
        }
    }

    /// Whether the socket is live right now
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.outbound().is_some_and(|tx| !tx.is_closed())
    }

    /// Send a frame if connected. Returns whether the frame was handed to the socket.
    pub fn emit(&self, frame: ClientFrame) -> bool {
        let Some(tx) = self.outbound().filter(|tx| !tx.is_closed()) else {
            debug!(episode_id = frame.episode_id(), "Not connected, frame dropped");
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to queue realtime frame");
                false
            }
        }
    }

    /// Registry inbound events are dispatched into
    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct Supervisor {
    url: String,
    attempts: u32,
    delay: Duration,
    connector: Arc<dyn RealtimeConnector>,
    registry: SubscriptionRegistry,
    outbound: OutboundSlot,
    cancel: CancellationToken,
}

impl Supervisor {
    fn set_outbound(&self, tx: Option<mpsc::Sender<ClientFrame>>) {
        *self
            .outbound
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = tx;
    }

    async fn run(self) {
        let mut failures: u32 = 0;
        loop {
            let attempt = tokio::select! {
                () = self.cancel.cancelled() => return,
                attempt = self.connector.connect(&self.url) => attempt,
            };

            match attempt {
                Ok(connection) => {
                    failures = 0;
                    info!(url = %self.url, "Realtime channel connected");
                    self.set_outbound(Some(connection.outbound.clone()));
                    self.pump(connection).await;
                    self.set_outbound(None);
                    info!(url = %self.url, "Realtime channel disconnected");
                    if self.cancel.is_cancelled() {
                        return;
                    }
                }
                Err(e) => {
                    failures += 1;
                    if failures > self.attempts {
                        warn!(
                            url = %self.url,
                            error = %e,
                            "Realtime channel unavailable, giving up; polling remains the only progress source"
                        );
                        return;
                    }
                    warn!(url = %self.url, attempt = failures, error = %e, "Realtime connection failed, retrying");
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(self.delay) => {}
            }
        }
    }

    /// Forward inbound frames until the connection closes or the session is cancelled
    async fn pump(&self, connection: Connection) {
        let Connection {
            outbound,
            mut inbound,
        } = connection;
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = outbound.closed() => break,
                frame = inbound.recv() => match frame {
                    Some(frame) => self.forward(frame),
                    None => break,
                },
            }
        }
    }

    fn forward(&self, frame: ServerFrame) {
        let name = frame.event.clone();
        match frame.into_event() {
            Ok(Some(event)) => {
                self.registry.dispatch(&event);
            }
            Ok(None) => debug!(event = %name, "Ignoring realtime event"),
            Err(e) => warn!(event = %name, error = %e, "Dropping malformed realtime event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_rewrites_http() {
        assert_eq!(
            websocket_url("http://localhost:8055/ws").unwrap().as_str(),
            "ws://localhost:8055/ws"
        );
        assert_eq!(
            websocket_url("https://api.example.test").unwrap().scheme(),
            "wss"
        );
        assert_eq!(
            websocket_url("ws://localhost:8055").unwrap().scheme(),
            "ws"
        );
        assert!(matches!(
            websocket_url("ftp://example.test"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(websocket_url("::not a url").is_err());
    }

    #[test]
    fn test_connect_without_runtime_is_ignored() {
        let channel = TransportChannel::new(
            RealtimeConfig::default(),
            Arc::new(TungsteniteConnector::default()),
            SubscriptionRegistry::new(),
        );
        channel.connect();
        assert!(!channel.is_connected());
        assert!(!channel.emit(ClientFrame::join("ep-1")));
        channel.disconnect();
    }
}
