//! Transport, registry and rooms against an in-memory connector

use async_trait::async_trait;
use serde_json::json;
use showrunner_core::{EpisodeStatus, EventKind, RealtimeEvent};
use showrunner_realtime::{
    ClientFrame, Connection, EpisodeProgressMap, Error, RealtimeClient, RealtimeConfig,
    RealtimeConnector, Result, ServerFrame,
};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Server side of one accepted connection
struct Peer {
    frames: mpsc::Receiver<ClientFrame>,
    events: mpsc::Sender<ServerFrame>,
}

impl Peer {
    async fn push(&self, event: &str, data: serde_json::Value) {
        self.events.send(ServerFrame::new(event, data)).await.unwrap();
    }

    fn drain(&mut self) -> Vec<ClientFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.frames.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

struct StubConnector {
    refusals: AtomicU32,
    attempts: AtomicU32,
    peers: mpsc::UnboundedSender<Peer>,
}

impl StubConnector {
    fn new(refusals: u32) -> (Arc<Self>, mpsc::UnboundedReceiver<Peer>) {
        let (peers, accepted) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            refusals: AtomicU32::new(refusals),
            attempts: AtomicU32::new(0),
            peers,
        });
        (connector, accepted)
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RealtimeConnector for StubConnector {
    async fn connect(&self, _url: &str) -> Result<Connection> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(Error::Connect("connection refused".to_string()));
        }

        let (outbound, frames) = mpsc::channel(16);
        let (events, inbound) = mpsc::channel(16);
        let _ = self.peers.send(Peer { frames, events });
        Ok(Connection { outbound, inbound })
    }
}

fn config() -> RealtimeConfig {
    RealtimeConfig::new("ws://realtime.test/ws")
        .with_reconnect_attempts(5)
        .with_reconnect_delay(Duration::from_secs(1))
}

/// Let spawned tasks run to their next suspension point
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&RealtimeEvent) + Send + Sync + 'static) {
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&calls);
    (calls, move |_: &RealtimeEvent| {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test(start_paused = true)]
async fn test_first_subscription_connects_lazily() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector.clone());
    settle().await;
    assert_eq!(connector.attempts(), 0);
    assert!(!client.is_connected());

    let (_calls, callback) = counter();
    let _sub = client.subscribe(EventKind::Progress, callback);
    let _peer = accepted.recv().await.unwrap();
    settle().await;

    assert!(client.is_connected());
    assert_eq!(connector.attempts(), 1);

    // Further subscriptions reuse the live connection
    let _status = client.subscribe(EventKind::Status, |_| {});
    settle().await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_callback_receives_nothing_more() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector);
    let (calls, callback) = counter();
    let sub = client.subscribe(EventKind::Progress, callback);
    let peer = accepted.recv().await.unwrap();

    let event = json!({"episodeId": "ep-1", "phase": "Beat Sheet", "progress": 25});
    peer.push("progress", event.clone()).await;
    settle().await;
    sub.unsubscribe();
    peer.push("progress", event).await;
    settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!client.registry().has_kind(EventKind::Progress));
}

#[tokio::test(start_paused = true)]
async fn test_inbound_events_route_by_kind() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector);
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&statuses);
    let _status = client.subscribe(EventKind::Status, move |event| {
        if let RealtimeEvent::Status(status) = event {
            sink.lock().unwrap().push(status.status.clone());
        }
    });
    let (progress_calls, callback) = counter();
    let _progress = client.subscribe(EventKind::Progress, callback);
    let peer = accepted.recv().await.unwrap();

    peer.push("status", json!({"episodeId": "ep-1", "status": "processing"}))
        .await;
    peer.push("status", json!({"garbage": true})).await;
    peer.push("heartbeat", json!({})).await;
    peer.push("status", json!({"episodeId": "ep-1", "status": "completed"}))
        .await;
    settle().await;

    assert_eq!(
        *statuses.lock().unwrap(),
        vec![EpisodeStatus::Processing, EpisodeStatus::Completed]
    );
    assert_eq!(progress_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_double_join_and_leave_is_harmless() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector);

    // Disconnected: nothing is queued
    assert!(!client.join_episode_room("ep-7"));

    client.connect();
    let mut peer = accepted.recv().await.unwrap();
    settle().await;

    assert!(client.join_episode_room("ep-7"));
    assert!(client.join_episode_room("ep-7"));
    assert!(client.leave_episode_room("ep-7"));
    assert!(client.leave_episode_room("ep-7"));

    assert_eq!(
        peer.drain(),
        vec![
            ClientFrame::join("ep-7"),
            ClientFrame::join("ep-7"),
            ClientFrame::leave("ep-7"),
            ClientFrame::leave("ep-7"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_room_membership_leaves_on_drop() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector);
    client.connect();
    let mut peer = accepted.recv().await.unwrap();
    settle().await;

    let membership = client.rooms().enter("ep-3");
    assert_eq!(membership.episode_id(), "ep-3");
    drop(membership);

    assert_eq!(
        peer.drain(),
        vec![ClientFrame::join("ep-3"), ClientFrame::leave("ep-3")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_connect_is_idempotent() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector.clone());
    client.connect();
    client.connect();
    let _peer = accepted.recv().await.unwrap();
    settle().await;
    client.connect();
    settle().await;

    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_attempts_are_bounded() {
    let (connector, _accepted) = StubConnector::new(u32::MAX);
    let client = RealtimeClient::new(config(), connector.clone());
    client.connect();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(connector.attempts(), 3);

    tokio::time::sleep(Duration::from_secs(30)).await;
    // One initial attempt plus five retries
    assert_eq!(connector.attempts(), 6);
    assert!(!client.is_connected());

    // A later connect starts a fresh cycle
    client.connect();
    settle().await;
    assert_eq!(connector.attempts(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_after_drop() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector.clone());
    client.connect();
    let peer = accepted.recv().await.unwrap();
    settle().await;
    assert!(client.is_connected());

    drop(peer);
    settle().await;
    assert!(!client.is_connected());

    let _peer = accepted.recv().await.unwrap();
    settle().await;
    assert!(client.is_connected());
    assert_eq!(connector.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_tears_down() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector.clone());
    client.connect();
    let mut peer = accepted.recv().await.unwrap();
    settle().await;

    client.disconnect();
    client.disconnect();
    settle().await;

    assert!(!client.is_connected());
    assert!(!client.join_episode_room("ep-1"));
    // The outbound half is released, so the peer sees the close
    assert!(peer.frames.recv().await.is_none());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_progress_map_follows_one_episode() {
    let (connector, mut accepted) = StubConnector::new(0);
    let client = RealtimeClient::new(config(), connector);
    client.connect();
    let mut peer = accepted.recv().await.unwrap();
    settle().await;

    let map = EpisodeProgressMap::attach(&client, Some("ep-1"));
    peer.push(
        "progress",
        json!({"episodeId": "ep-1", "phase": "Scene Generation", "progress": 40, "message": "scene 3/8"}),
    )
    .await;
    peer.push("progress", json!({"episodeId": "ep-2", "phase": "x", "progress": 90}))
        .await;
    peer.push("status", json!({"episodeId": "ep-1", "status": "completed"}))
        .await;
    settle().await;

    let entry = map.get("ep-1").unwrap();
    assert_eq!(entry.phase, "Scene Generation");
    assert_eq!(entry.message.as_deref(), Some("scene 3/8"));
    assert_eq!(entry.status, EpisodeStatus::Completed);
    assert!(map.get("ep-2").is_none());

    drop(map);
    assert_eq!(
        peer.drain(),
        vec![ClientFrame::join("ep-1"), ClientFrame::leave("ep-1")]
    );
    assert!(!client.registry().has_kind(EventKind::Progress));
}
