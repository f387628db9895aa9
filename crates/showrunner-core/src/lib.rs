//! Showrunner Core - Domain Model
//!
//! This crate provides the types shared by every other Showrunner crate:
//! - Episode: episode records, lifecycle status and generation flags
//! - Flag: normalization of boolean-like backend fields
//! - Events: realtime progress and status events
//! - Phase: the script and audio workflow catalogs
//! - UI: process-wide toast and generation progress store

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod episode;
pub mod error;
pub mod events;
pub mod flag;
pub mod phase;
pub mod ui;

pub use episode::{
    BadgeTone, Character, Episode, EpisodeStatus, GenerationBadge, Page, Show, StatusBadge,
};
pub use error::{Error, Result};
pub use events::{EventKind, ProgressEvent, RealtimeEvent, StatusEvent};
pub use phase::{PhaseId, WorkflowKind};
pub use ui::{
    GenerationProgress, ProgressStatus, ProgressValue, Toast, ToastKind, ToastRequest, UiState,
    UiStore, DEFAULT_TOAST_DURATION,
};
