//! Showrunner API - Backend REST Client
//!
//! This crate talks to the generation backend over HTTP:
//! - Client: reqwest-based [`ApiClient`] and the [`EpisodeApi`] seam used by workflows
//! - Action: the long-running generation endpoints
//! - Status: detailed per-phase workflow status and the audit report
//! - Environment: test/production mode advertised by the backend

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod status;
pub mod types;

pub use action::{ActionAck, EpisodeAction};
pub use client::{ApiClient, EpisodeApi};
pub use config::ApiConfig;
pub use environment::{EnvironmentMode, ENVIRONMENT_HEADER};
pub use error::{Error, Result};
pub use status::{
    AssemblyPhase, AudioPhases, AudioStatus, AuditReport, AuditSection, DetailedStatus,
    FileCount, FilesPhase, ManifestPhase, PhaseCompletion, PhaseProgressDetail, ScriptPhases,
    ScriptStatus,
};
pub use types::{
    CreateEpisode, EpisodeQuery, EpisodeUpdate, GenerateEpisode, GenerateShow, ShowQuery,
    ShowUpdate, DEFAULT_PAGE_SIZE,
};
