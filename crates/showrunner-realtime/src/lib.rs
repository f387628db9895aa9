//! Showrunner Realtime - Push Event Plumbing
//!
//! This crate provides the shared realtime connection and everything layered on it:
//! - Transport: reconnecting WebSocket channel with a swappable connector
//! - Registry: in-process pub/sub for `progress` and `status` events
//! - Rooms: per-episode scoping requests
//! - Progress: live per-episode progress map

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod progress;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod transport;

pub use client::RealtimeClient;
pub use config::RealtimeConfig;
pub use error::{Error, Result};
pub use progress::{EpisodeProgress, EpisodeProgressMap};
pub use protocol::{ClientFrame, RoomRequest, ServerFrame};
pub use registry::{Callback, Subscription, SubscriptionRegistry};
pub use rooms::{RoomMembership, RoomTracker};
pub use transport::{websocket_url, Connection, RealtimeConnector, TransportChannel, TungsteniteConnector};
