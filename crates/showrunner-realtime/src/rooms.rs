//! Episode room membership
//!
//! Rooms scope backend pushes to the episodes currently open. Requests are
//! sent only while connected and are never queued; the backend treats repeated
//! joins and leaves as idempotent, so nothing is counted or deduplicated here.

use crate::protocol::ClientFrame;
use crate::transport::TransportChannel;
use std::sync::Arc;
use tracing::debug;

/// Sends room scoping requests over the shared channel
#[derive(Debug, Clone)]
pub struct RoomTracker {
    transport: Arc<TransportChannel>,
}

impl RoomTracker {
    /// Create a tracker over `transport`
    #[must_use]
    pub fn new(transport: Arc<TransportChannel>) -> Self {
        Self { transport }
    }

    /// Ask for events about `episode_id`. Returns whether the request was sent.
    pub fn join_episode_room(&self, episode_id: &str) -> bool {
        let sent = self.transport.emit(ClientFrame::join(episode_id));
        debug!(episode_id, sent, "Join episode room");
        sent
    }

    /// Stop events about `episode_id`. Returns whether the request was sent.
    pub fn leave_episode_room(&self, episode_id: &str) -> bool {
        let sent = self.transport.emit(ClientFrame::leave(episode_id));
        debug!(episode_id, sent, "Leave episode room");
        sent
    }

    /// Join now and leave when the returned guard is dropped
    #[must_use = "dropping the membership leaves the room immediately"]
    pub fn enter(&self, episode_id: impl Into<String>) -> RoomMembership {
        let episode_id = episode_id.into();
        self.join_episode_room(&episode_id);
        RoomMembership {
            tracker: self.clone(),
            episode_id,
        }
    }
}

/// Scoped room membership, left on drop
#[derive(Debug)]
pub struct RoomMembership {
    tracker: RoomTracker,
    episode_id: String,
}

impl RoomMembership {
    /// Episode this membership covers
    #[must_use]
    pub fn episode_id(&self) -> &str {
        &self.episode_id
    }

    /// Re-send the join, e.g. after the channel reconnected
    pub fn rejoin(&self) -> bool {
        self.tracker.join_episode_room(&self.episode_id)
    }
}

impl Drop for RoomMembership {
    fn drop(&mut self) {
        self.tracker.leave_episode_room(&self.episode_id);
    }
}
