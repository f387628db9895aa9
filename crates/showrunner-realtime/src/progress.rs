//! Per-episode progress map fed by realtime events

use crate::client::RealtimeClient;
use crate::registry::Subscription;
use crate::rooms::RoomMembership;
use showrunner_core::{EpisodeStatus, EventKind, RealtimeEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Latest known progress for one episode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeProgress {
    /// Phase label from the backend
    pub phase: String,
    /// Percentage, 0-100, when reported
    pub progress: Option<f64>,
    /// Last status; progress events imply `processing`
    pub status: EpisodeStatus,
    /// Last message
    pub message: Option<String>,
}

type ProgressTable = Arc<Mutex<HashMap<String, EpisodeProgress>>>;

fn table(state: &ProgressTable) -> MutexGuard<'_, HashMap<String, EpisodeProgress>> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn apply(state: &ProgressTable, filter: Option<&str>, event: &RealtimeEvent) {
    if filter.is_some_and(|id| id != event.episode_id()) {
        return;
    }
    let mut table = table(state);
    let entry = table.entry(event.episode_id().to_string()).or_default();
    match event {
        RealtimeEvent::Progress(progress) => {
            entry.phase.clone_from(&progress.phase);
            entry.progress = progress.progress;
            entry.message.clone_from(&progress.message);
            entry.status = EpisodeStatus::Processing;
        }
        RealtimeEvent::Status(status) => entry.status = status.status.clone(),
    }
}

/// Live map of episode progress. Listens while alive; dropping it
/// unsubscribes and leaves the room it joined.
#[derive(Debug)]
pub struct EpisodeProgressMap {
    state: ProgressTable,
    _subscriptions: [Subscription; 2],
    _room: Option<RoomMembership>,
}

impl EpisodeProgressMap {
    /// Track every episode, or only `episode_id` (joining its room) when given
    #[must_use]
    pub fn attach(client: &RealtimeClient, episode_id: Option<&str>) -> Self {
        let state: ProgressTable = Arc::default();
        let filter = episode_id.map(str::to_string);

        let progress = {
            let state = Arc::clone(&state);
            let filter = filter.clone();
            client.subscribe(EventKind::Progress, move |event| {
                apply(&state, filter.as_deref(), event);
            })
        };
        let status = {
            let state = Arc::clone(&state);
            let filter = filter.clone();
            client.subscribe(EventKind::Status, move |event| {
                apply(&state, filter.as_deref(), event);
            })
        };
        let room = filter.map(|id| client.rooms().enter(id));

        Self {
            state,
            _subscriptions: [progress, status],
            _room: room,
        }
    }

    /// Progress for one episode
    #[must_use]
    pub fn get(&self, episode_id: &str) -> Option<EpisodeProgress> {
        table(&self.state).get(episode_id).cloned()
    }

    /// Every tracked episode
    #[must_use]
    pub fn all(&self) -> HashMap<String, EpisodeProgress> {
        table(&self.state).clone()
    }
}
