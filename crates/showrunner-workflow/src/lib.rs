//! Showrunner Workflow - Generation Tracking
//!
//! This crate drives the script and audio generation workflows of an episode:
//! - Phase: per-phase status state machine and the ordered phase board
//! - Poller: fixed-interval fallback probe with idempotent cancellation
//! - Tracker: per-episode run lock and push/poll/action reconciliation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod phase;
pub mod poller;
pub mod tracker;

pub use config::WorkflowConfig;
pub use error::{Error, Result};
pub use phase::{InvalidTransition, PhaseBoard, PhaseState, PhaseStatus};
pub use poller::PollHandle;
pub use tracker::{RunHandle, RunOutcome, RunTarget, WorkflowTracker};
