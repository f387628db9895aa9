//! Realtime events pushed by the backend
//!
//! Two event kinds exist: `progress` (transient, most recent wins per episode)
//! and `status` (patches the cached episode status).

use crate::episode::EpisodeStatus;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named event kind used for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Job progress update
    Progress,
    /// Episode status change
    Status,
}

impl EventKind {
    /// Wire name of the event
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Progress => "progress",
            Self::Status => "status",
        }
    }

    /// Resolve a wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "progress" => Some(Self::Progress),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a backend job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Episode the job belongs to
    pub episode_id: String,
    /// Free-text phase name chosen by the backend
    #[serde(default)]
    pub phase: String,
    /// Percentage, 0-100; absent when the backend cannot tell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Optional human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Episode status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    /// Episode whose status changed
    pub episode_id: String,
    /// New status
    pub status: EpisodeStatus,
}

/// Any event delivered over the realtime channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// See [`ProgressEvent`]
    Progress(ProgressEvent),
    /// See [`StatusEvent`]
    Status(StatusEvent),
}

impl RealtimeEvent {
    /// Decode an event payload delivered under a known kind.
    ///
    /// The payload's own `type` field, if any, is ignored in favour of `kind`.
    pub fn from_payload(kind: EventKind, payload: serde_json::Value) -> Result<Self> {
        Ok(match kind {
            EventKind::Progress => Self::Progress(serde_json::from_value(payload)?),
            EventKind::Status => Self::Status(serde_json::from_value(payload)?),
        })
    }

    /// Kind of this event
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Progress(_) => EventKind::Progress,
            Self::Status(_) => EventKind::Status,
        }
    }

    /// Episode this event concerns
    #[must_use]
    pub fn episode_id(&self) -> &str {
        match self {
            Self::Progress(event) => &event.episode_id,
            Self::Status(event) => &event.episode_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_payload_decodes() {
        let event = RealtimeEvent::from_payload(
            EventKind::Progress,
            json!({
                "type": "progress",
                "episodeId": "ep-1",
                "phase": "scenes",
                "progress": 42,
                "message": "Scene 3 of 7"
            }),
        )
        .unwrap();

        assert_eq!(event.kind(), EventKind::Progress);
        assert_eq!(event.episode_id(), "ep-1");
        match event {
            RealtimeEvent::Progress(p) => {
                assert_eq!(p.phase, "scenes");
                assert_eq!(p.progress, Some(42.0));
                assert_eq!(p.message.as_deref(), Some("Scene 3 of 7"));
            }
            other => panic!("expected progress, got {:?}", other),
        }
    }

    #[test]
    fn test_progress_without_percentage() {
        let event = RealtimeEvent::from_payload(
            EventKind::Progress,
            json!({"episodeId": "ep-1", "phase": "assembly"}),
        )
        .unwrap();
        match event {
            RealtimeEvent::Progress(p) => assert!(p.progress.is_none()),
            other => panic!("expected progress, got {:?}", other),
        }
    }

    #[test]
    fn test_status_payload_decodes() {
        let event = RealtimeEvent::from_payload(
            EventKind::Status,
            json!({"type": "status", "episodeId": "ep-9", "status": "completed"}),
        )
        .unwrap();
        match event {
            RealtimeEvent::Status(s) => assert!(s.status.is_completed()),
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload_is_error() {
        let result = RealtimeEvent::from_payload(EventKind::Status, json!({"status": 3}));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::from_name("progress"), Some(EventKind::Progress));
        assert_eq!(EventKind::from_name("status"), Some(EventKind::Status));
        assert_eq!(EventKind::from_name("connect"), None);
        assert_eq!(EventKind::Status.to_string(), "status");
    }
}
