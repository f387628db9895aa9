//! Realtime client: transport, registry and rooms wired together

use crate::config::RealtimeConfig;
use crate::registry::{Subscription, SubscriptionRegistry};
use crate::rooms::RoomTracker;
use crate::transport::{RealtimeConnector, TransportChannel, TungsteniteConnector};
use showrunner_core::{EventKind, RealtimeEvent};
use std::sync::{Arc, Weak};

/// Process-wide realtime handle. Cheap to clone; clones share one connection.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    transport: Arc<TransportChannel>,
    rooms: RoomTracker,
}

impl RealtimeClient {
    /// Create a client over `connector`. Nothing connects until the first
    /// subscription or an explicit [`connect`](Self::connect).
    #[must_use]
    pub fn new(config: RealtimeConfig, connector: Arc<dyn RealtimeConnector>) -> Self {
        let registry = SubscriptionRegistry::new();
        let transport = Arc::new(TransportChannel::new(config, connector, registry.clone()));

        let weak: Weak<TransportChannel> = Arc::downgrade(&transport);
        registry.set_connect_hook(move || {
            if let Some(transport) = weak.upgrade() {
                if !transport.is_connected() {
                    transport.connect();
                }
            }
        });

        let rooms = RoomTracker::new(Arc::clone(&transport));
        Self { transport, rooms }
    }

    /// Client over a real WebSocket
    #[must_use]
    pub fn websocket(config: RealtimeConfig) -> Self {
        let connector = Arc::new(TungsteniteConnector::new(config.event_buffer));
        Self::new(config, connector)
    }

    /// See [`TransportChannel::connect`]
    pub fn connect(&self) {
        self.transport.connect();
    }

    /// See [`TransportChannel::disconnect`]
    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    /// Whether the socket is live right now
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Register a callback; connects lazily
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&RealtimeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.transport.registry().subscribe(kind, callback)
    }

    /// Shared registry
    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        self.transport.registry()
    }

    /// Room tracker
    #[must_use]
    pub fn rooms(&self) -> &RoomTracker {
        &self.rooms
    }

    /// Join a room if connected
    pub fn join_episode_room(&self, episode_id: &str) -> bool {
        self.rooms.join_episode_room(episode_id)
    }

    /// Leave a room if connected
    pub fn leave_episode_room(&self, episode_id: &str) -> bool {
        self.rooms.leave_episode_room(episode_id)
    }
}
