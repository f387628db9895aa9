//! Wire frames
//!
//! Every frame is a JSON text message of the form `{"event": <name>, "data": <payload>}`.
//! Outbound frames scope the connection to episode rooms; inbound frames carry
//! `progress` and `status` events.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use showrunner_core::{EventKind, RealtimeEvent};

/// Room scoping payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRequest {
    /// Episode to scope to
    #[serde(rename = "episodeId")]
    pub episode_id: String,
}

/// Frame sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Start receiving events for an episode
    JoinEpisode(RoomRequest),
    /// Stop receiving events for an episode
    LeaveEpisode(RoomRequest),
}

impl ClientFrame {
    /// Join frame for `episode_id`
    #[must_use]
    pub fn join(episode_id: impl Into<String>) -> Self {
        Self::JoinEpisode(RoomRequest {
            episode_id: episode_id.into(),
        })
    }

    /// Leave frame for `episode_id`
    #[must_use]
    pub fn leave(episode_id: impl Into<String>) -> Self {
        Self::LeaveEpisode(RoomRequest {
            episode_id: episode_id.into(),
        })
    }

    /// Episode the frame refers to
    #[must_use]
    pub fn episode_id(&self) -> &str {
        match self {
            Self::JoinEpisode(room) | Self::LeaveEpisode(room) => &room.episode_id,
        }
    }

    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frame received from the backend, payload still untyped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFrame {
    /// Event name
    pub event: String,
    /// Event payload
    #[serde(default)]
    pub data: Value,
}

impl ServerFrame {
    /// Build a frame
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Parse a text message
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Frame carrying a typed event
    pub fn from_event(event: &RealtimeEvent) -> Result<Self> {
        Ok(Self::new(event.kind().as_str(), serde_json::to_value(event)?))
    }

    /// Typed event, or `Ok(None)` when the event name is not one we consume
    pub fn into_event(self) -> Result<Option<RealtimeEvent>> {
        let Some(kind) = EventKind::from_name(&self.event) else {
            return Ok(None);
        };
        Ok(Some(RealtimeEvent::from_payload(kind, self.data)?))
    }
}
