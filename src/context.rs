//! Application context
//!
//! Explicitly constructed handles shared by every command: the REST client,
//! the realtime client, the UI store and the process shutdown token.

use crate::config::AppConfig;
use crate::environment::spawn_watcher;
use anyhow::{Context, Result};
use showrunner_api::{ApiClient, EnvironmentMode, EpisodeApi};
use showrunner_core::{UiStore, WorkflowKind};
use showrunner_realtime::RealtimeClient;
use showrunner_workflow::WorkflowTracker;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub struct AppContext {
    pub config: AppConfig,
    pub api: Arc<ApiClient>,
    pub realtime: RealtimeClient,
    pub ui: UiStore,
    pub shutdown: CancellationToken,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let api = ApiClient::new(config.api.clone()).context("Failed to create API client")?;
        let realtime = RealtimeClient::websocket(config.realtime.clone());
        let ui = UiStore::with_default_duration(config.ui.toast_duration());
        Ok(Self {
            config,
            api: Arc::new(api),
            realtime,
            ui,
            shutdown: CancellationToken::new(),
        })
    }

    /// Tracker for one episode, listening for pushes in the episode room
    pub fn tracker(&self, episode_id: &str, kind: WorkflowKind) -> WorkflowTracker {
        let api: Arc<dyn EpisodeApi> = self.api.clone();
        let tracker = WorkflowTracker::new(
            episode_id,
            kind,
            api,
            self.ui.clone(),
            self.config.workflow.clone(),
        );
        tracker.attach(&self.realtime);
        tracker
    }

    /// Background environment indicator, stopped with the context
    pub fn watch_environment(&self) -> watch::Receiver<EnvironmentMode> {
        let api = Arc::clone(&self.api);
        spawn_watcher(
            self.config.environment.recheck_interval(),
            move || {
                let api = Arc::clone(&api);
                async move { api.environment_mode().await }
            },
            self.shutdown.child_token(),
        )
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.realtime.disconnect();
    }
}
