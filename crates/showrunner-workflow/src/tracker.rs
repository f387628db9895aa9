//! Per-episode workflow tracker
//!
//! Owns the phase board of one episode's script or audio workflow and drives
//! runs against the backend. Each run has a single reconciliation loop fed by
//! three sources: the triggering action, the fallback poll and pushed status
//! events. The first terminal signal wins; everything after it is ignored.
//!
//! ## Usage
//!
//! ```ignore
//! let tracker = WorkflowTracker::new(episode_id, WorkflowKind::Script, api, ui, config);
//! tracker.attach(&realtime);
//! tracker.load().await?;
//!
//! let run = tracker.run_phase(PhaseId::BeatSheet).await?;
//! let outcome = run.wait().await;
//!
//! tracker.shutdown();
//! ```

use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use crate::phase::{PhaseBoard, PhaseState, PhaseStatus};
use crate::poller::{self, PollHandle};
use showrunner_api::{DetailedStatus, EpisodeAction, EpisodeApi};
use showrunner_core::{
    Episode, EventKind, GenerationProgress, PhaseId, ProgressStatus, ProgressValue,
    RealtimeEvent, ToastRequest, UiStore, WorkflowKind,
};
use showrunner_realtime::{RealtimeClient, RoomMembership, Subscription, SubscriptionRegistry};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a run drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunTarget {
    /// One phase
    Phase(PhaseId),
    /// The umbrella action of a workflow
    Full(WorkflowKind),
}

impl RunTarget {
    fn name(self) -> String {
        match self {
            Self::Phase(phase) => phase.name().to_string(),
            Self::Full(kind) => kind.label().to_string(),
        }
    }

    fn started_title(self) -> String {
        match self {
            Self::Phase(phase) => format!("Starting {}...", phase.name()),
            Self::Full(kind) => format!("Starting full {} workflow...", kind.label().to_lowercase()),
        }
    }

    fn success_title(self) -> String {
        format!("{} completed successfully!", self.name())
    }

    fn failure_title(self) -> String {
        format!("{} failed", self.name())
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phase(phase) => write!(f, "{}", phase.slug()),
            Self::Full(kind) => write!(f, "full-{}", kind.as_str()),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Completion was detected
    Completed,
    /// The action was rejected or the backend reported failure
    Failed(String),
    /// No terminal signal within the configured deadline
    TimedOut,
    /// The tracker was shut down mid-run
    Cancelled,
}

impl RunOutcome {
    /// Whether the run succeeded
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Handle to a started run
#[derive(Debug)]
pub struct RunHandle {
    target: RunTarget,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// What this run drives
    #[must_use]
    pub fn target(&self) -> RunTarget {
        self.target
    }

    /// Whether the run has finished, including its follow-up refresh
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the outcome
    pub async fn wait(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::Failed(format!("run task failed: {e}")),
        }
    }
}

struct ActiveRun {
    id: u64,
    target: RunTarget,
    pushes: mpsc::UnboundedSender<RealtimeEvent>,
    poll: CancellationToken,
}

struct TrackerState {
    board: PhaseBoard,
    episode: Option<Episode>,
    active: Option<ActiveRun>,
    next_run: u64,
    subscriptions: Vec<Subscription>,
    room: Option<RoomMembership>,
}

struct TrackerInner {
    episode_id: String,
    kind: WorkflowKind,
    api: Arc<dyn EpisodeApi>,
    ui: UiStore,
    config: WorkflowConfig,
    state: Mutex<TrackerState>,
    closed: CancellationToken,
}

/// What one probe saw
struct PollReport {
    episode: Option<Episode>,
    detailed: Option<DetailedStatus>,
    completed: bool,
}

/// Everything the run loop owns
struct RunPlan {
    id: u64,
    target: RunTarget,
    cancel: CancellationToken,
    pushes: mpsc::UnboundedReceiver<RealtimeEvent>,
    poll: PollHandle,
    reports: mpsc::Receiver<PollReport>,
    /// Target already reported complete before this run started
    stale: bool,
}

/// Workflow tracker for one episode. Clones share state.
#[derive(Clone)]
pub struct WorkflowTracker {
    inner: Arc<TrackerInner>,
}

impl fmt::Debug for WorkflowTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowTracker")
            .field("episode_id", &self.inner.episode_id)
            .field("kind", &self.inner.kind)
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

impl WorkflowTracker {
    /// Create a tracker with every phase pending
    #[must_use]
    pub fn new(
        episode_id: impl Into<String>,
        kind: WorkflowKind,
        api: Arc<dyn EpisodeApi>,
        ui: UiStore,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                episode_id: episode_id.into(),
                kind,
                api,
                ui,
                config,
                state: Mutex::new(TrackerState {
                    board: PhaseBoard::new(kind),
                    episode: None,
                    active: None,
                    next_run: 0,
                    subscriptions: Vec::new(),
                    room: None,
                }),
                closed: CancellationToken::new(),
            }),
        }
    }

    /// Listen for pushes and join the episode room
    pub fn attach(&self, realtime: &RealtimeClient) {
        self.listen(realtime.registry());
        let room = realtime.rooms().enter(self.inner.episode_id.clone());
        self.inner.state().room = Some(room);
    }

    /// Listen for pushes on `registry` without joining a room
    pub fn listen(&self, registry: &SubscriptionRegistry) {
        let subscriptions = [EventKind::Progress, EventKind::Status].map(|kind| {
            let weak: Weak<TrackerInner> = Arc::downgrade(&self.inner);
            registry.subscribe(kind, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_push(event);
                }
            })
        });
        self.inner.state().subscriptions.extend(subscriptions);
    }

    /// Episode id
    #[must_use]
    pub fn episode_id(&self) -> &str {
        &self.inner.episode_id
    }

    /// Workflow
    #[must_use]
    pub fn kind(&self) -> WorkflowKind {
        self.inner.kind
    }

    /// Snapshot of every phase
    #[must_use]
    pub fn phases(&self) -> Vec<PhaseState> {
        self.inner.state().board.phases().to_vec()
    }

    /// Status of one phase
    #[must_use]
    pub fn status(&self, phase: PhaseId) -> PhaseStatus {
        self.inner.state().board.status(phase)
    }

    /// Last fetched episode
    #[must_use]
    pub fn episode(&self) -> Option<Episode> {
        self.inner.state().episode.clone()
    }

    /// What is running, if anything
    #[must_use]
    pub fn active(&self) -> Option<RunTarget> {
        self.inner.state().active.as_ref().map(|run| run.target)
    }

    /// Whether the active lock is held
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.state().active.is_some()
    }

    /// Whether a fallback poll is scheduled
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.inner
            .state()
            .active
            .as_ref()
            .is_some_and(|run| !run.poll.is_cancelled())
    }

    /// Fetch the episode and set the baseline phase statuses.
    ///
    /// Phases the backend reports as done are promoted from pending to
    /// completed. When the detailed status endpoint is unavailable the coarse
    /// episode flag decides for every phase.
    pub async fn load(&self) -> Result<()> {
        self.inner.load().await
    }

    /// Run one phase
    pub async fn run_phase(&self, phase: PhaseId) -> Result<RunHandle> {
        if phase.workflow() != self.inner.kind {
            return Err(Error::WrongWorkflow {
                phase,
                workflow: self.inner.kind,
            });
        }
        self.start(RunTarget::Phase(phase)).await
    }

    /// Run the whole workflow through its umbrella action
    pub async fn run_full_workflow(&self) -> Result<RunHandle> {
        self.start(RunTarget::Full(self.inner.kind)).await
    }

    /// Unmount: cancel the active run, stop its poll, unsubscribe and leave the room
    pub fn shutdown(&self) {
        self.inner.closed.cancel();
        let (subscriptions, room) = {
            let mut state = self.inner.state();
            if let Some(run) = &state.active {
                run.poll.cancel();
            }
            (std::mem::take(&mut state.subscriptions), state.room.take())
        };
        drop(subscriptions);
        drop(room);
        debug!(episode_id = %self.inner.episode_id, "Tracker shut down");
    }

    async fn start(&self, target: RunTarget) -> Result<RunHandle> {
        let inner = &self.inner;
        if inner.closed.is_cancelled() {
            return Err(Error::ShutDown);
        }
        if let Some(active) = self.active() {
            return Err(Error::Busy {
                active: active.to_string(),
            });
        }
        if inner.kind == WorkflowKind::Audio && !inner.script_ready().await? {
            return Err(Error::ScriptRequired);
        }

        let (pushes_tx, pushes) = mpsc::unbounded_channel();
        let every = match target {
            RunTarget::Phase(_) => inner.config.phase_poll_interval(),
            RunTarget::Full(_) => inner.config.full_poll_interval(),
        };

        let plan = {
            let mut state = inner.state();
            if let Some(active) = &state.active {
                return Err(Error::Busy {
                    active: active.target.to_string(),
                });
            }
            let stale = match target {
                RunTarget::Phase(phase) => state.board.status(phase) == PhaseStatus::Completed,
                RunTarget::Full(_) => state.episode.as_ref().is_some_and(|e| inner.coarse_flag(e)),
            };
            if let RunTarget::Phase(phase) = target {
                if let Err(e) = state.board.transition(phase, PhaseStatus::InProgress) {
                    warn!(error = %e, "Unexpected phase status at run start");
                }
            }

            let probe_inner = Arc::clone(inner);
            let (poll, reports) = poller::start(every, move || {
                let inner = Arc::clone(&probe_inner);
                async move { inner.probe(target).await }
            });

            // Joins sent while disconnected were dropped
            if let Some(room) = &state.room {
                room.rejoin();
            }

            state.next_run += 1;
            let id = state.next_run;
            state.active = Some(ActiveRun {
                id,
                target,
                pushes: pushes_tx,
                poll: poll.token(),
            });
            RunPlan {
                id,
                target,
                cancel: inner.closed.child_token(),
                pushes,
                poll,
                reports,
                stale,
            }
        };

        info!(episode_id = %inner.episode_id, run = %target, "Run started");
        inner.ui.set_generating(true);
        inner.ui.set_progress(GenerationProgress {
            phase: target.name(),
            progress: ProgressValue::Indeterminate,
            status: ProgressStatus::InProgress,
            message: None,
        });
        inner.ui.show_toast(ToastRequest::info(target.started_title()));

        let task = tokio::spawn(Arc::clone(inner).drive(plan));
        Ok(RunHandle { target, task })
    }
}

impl TrackerInner {
    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn coarse_flag(&self, episode: &Episode) -> bool {
        match self.kind {
            WorkflowKind::Script => episode.script_generated,
            WorkflowKind::Audio => episode.assets_generated,
        }
    }

    async fn script_ready(&self) -> Result<bool> {
        let cached = self.state().episode.as_ref().map(|e| e.script_generated);
        if let Some(ready) = cached {
            return Ok(ready);
        }
        let episode = self.api.get_episode(&self.episode_id).await?;
        let ready = episode.script_generated;
        self.state().episode = Some(episode);
        Ok(ready)
    }

    async fn load(&self) -> Result<()> {
        let episode = self.api.get_episode(&self.episode_id).await?;
        let detailed = self.api.detailed_status(&self.episode_id, self.kind).await;

        let mut state = self.state();
        match detailed {
            Ok(detailed) => {
                for &phase in self.kind.phases() {
                    state
                        .board
                        .sync_completed(phase, detailed.is_phase_completed(phase));
                    state.board.set_detail(phase, detailed.detail(phase));
                }
            }
            Err(e) => {
                debug!(error = %e, "Detailed status unavailable, using coarse flag");
                let done = self.coarse_flag(&episode);
                for &phase in self.kind.phases() {
                    state.board.sync_completed(phase, done);
                }
            }
        }
        state.episode = Some(episode);
        Ok(())
    }

    /// Re-fetch and judge completion of `target`
    async fn probe(&self, target: RunTarget) -> PollReport {
        let episode = match self.api.get_episode(&self.episode_id).await {
            Ok(episode) => Some(episode),
            Err(e) => {
                warn!(episode_id = %self.episode_id, error = %e, "Error polling episode");
                None
            }
        };

        let RunTarget::Phase(phase) = target else {
            let completed = episode.as_ref().is_some_and(|e| self.coarse_flag(e));
            return PollReport {
                episode,
                detailed: None,
                completed,
            };
        };

        match self.api.detailed_status(&self.episode_id, self.kind).await {
            Ok(detailed) => PollReport {
                completed: detailed.is_phase_completed(phase),
                episode,
                detailed: Some(detailed),
            },
            Err(e) => {
                debug!(error = %e, "Detailed status unavailable, using coarse flag");
                PollReport {
                    completed: episode.as_ref().is_some_and(|e| self.coarse_flag(e)),
                    episode,
                    detailed: None,
                }
            }
        }
    }

    /// Keep what a probe fetched; returns whether it saw completion
    fn absorb(&self, report: PollReport) -> bool {
        let mut state = self.state();
        if let Some(episode) = report.episode {
            state.episode = Some(episode);
        }
        if let Some(detailed) = &report.detailed {
            for &phase in self.kind.phases() {
                state.board.set_detail(phase, detailed.detail(phase));
            }
        }
        report.completed
    }

    fn on_push(&self, event: &RealtimeEvent) {
        if event.episode_id() != self.episode_id {
            return;
        }
        let mut state = self.state();
        match event {
            RealtimeEvent::Progress(progress) => {
                let value = ProgressValue::from_reported(progress.progress);
                for phase in state.board.in_progress() {
                    state.board.set_progress(phase, value);
                }
                self.ui.set_progress(GenerationProgress {
                    phase: progress.phase.clone(),
                    progress: value,
                    status: ProgressStatus::InProgress,
                    message: progress.message.clone(),
                });
            }
            RealtimeEvent::Status(status) => {
                if let Some(episode) = state.episode.as_mut() {
                    episode.status = status.status.clone();
                }
            }
        }
        if let Some(run) = &state.active {
            let _ = run.pushes.send(event.clone());
        }
    }

    async fn drive(self: Arc<Self>, plan: RunPlan) -> RunOutcome {
        let RunPlan {
            id,
            target,
            cancel,
            mut pushes,
            poll,
            mut reports,
            stale,
        } = plan;

        let action = match target {
            RunTarget::Phase(phase) => EpisodeAction::for_phase(phase),
            RunTarget::Full(kind) => EpisodeAction::full(kind),
        };
        let mut action_task = {
            let api = Arc::clone(&self.api);
            let episode_id = self.episode_id.clone();
            tokio::spawn(async move { api.run_action(&episode_id, &action).await })
        };
        let mut action_pending = true;

        let max_run = self.config.max_run();
        let deadline = async move {
            match max_run {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break RunOutcome::Cancelled,
                () = &mut deadline => break RunOutcome::TimedOut,
                joined = &mut action_task, if action_pending => {
                    action_pending = false;
                    match joined {
                        Ok(Ok(ack)) => {
                            debug!(run = %target, message = ?ack.message, "Action accepted");
                            // Synchronous backends finish inside the call
                            if let Some(outcome) =
                                self.corroborate(target, &cancel, deadline.as_mut()).await
                            {
                                break outcome;
                            }
                        }
                        Ok(Err(e)) => break RunOutcome::Failed(Error::from(e).user_message()),
                        Err(e) => break RunOutcome::Failed(format!("action task failed: {e}")),
                    }
                }
                Some(event) = pushes.recv() => {
                    let RealtimeEvent::Status(status) = event else {
                        continue;
                    };
                    if status.status.is_failed() {
                        break RunOutcome::Failed("The backend reported a failure".to_string());
                    }
                    if !status.status.is_completed() {
                        continue;
                    }
                    // Episode-level completion does not say which phase finished;
                    // a phase that was already complete cannot be corroborated
                    if matches!(target, RunTarget::Full(_)) || stale {
                        break RunOutcome::Completed;
                    }
                    if let Some(outcome) =
                        self.corroborate(target, &cancel, deadline.as_mut()).await
                    {
                        break outcome;
                    }
                }
                Some(report) = reports.recv() => {
                    if !self.absorb(report) {
                        continue;
                    }
                    // Completion left over from an earlier run; wait for the action
                    if stale && action_pending {
                        debug!(run = %target, "Completion predates this run, waiting for the action");
                        continue;
                    }
                    break RunOutcome::Completed;
                }
            }
        };

        poll.cancel();
        self.finish(id, target, &outcome);
        if outcome.is_completed() {
            if let Err(e) = self.load().await {
                warn!(episode_id = %self.episode_id, error = %e, "Failed to refresh episode after run");
            }
        }
        outcome
    }

    /// Probe once outside the poll schedule. `Some` ends the run.
    async fn corroborate<D>(
        &self,
        target: RunTarget,
        cancel: &CancellationToken,
        deadline: Pin<&mut D>,
    ) -> Option<RunOutcome>
    where
        D: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Some(RunOutcome::Cancelled),
            () = deadline => Some(RunOutcome::TimedOut),
            report = self.probe(target) => self.absorb(report).then_some(RunOutcome::Completed),
        }
    }

    fn finish(&self, id: u64, target: RunTarget, outcome: &RunOutcome) {
        {
            let mut state = self.state();
            if state.active.as_ref().map(|run| run.id) != Some(id) {
                return;
            }
            state.active = None;
            if let RunTarget::Phase(phase) = target {
                let status = if outcome.is_completed() {
                    PhaseStatus::Completed
                } else {
                    PhaseStatus::Error
                };
                if let Err(e) = state.board.transition(phase, status) {
                    warn!(error = %e, "Ignoring phase transition");
                }
            }
        }

        self.ui.set_generating(false);
        match outcome {
            RunOutcome::Completed => {
                info!(episode_id = %self.episode_id, run = %target, "Run completed");
                self.ui.set_progress(GenerationProgress {
                    phase: target.name(),
                    progress: ProgressValue::Percent(100.0),
                    status: ProgressStatus::Completed,
                    message: None,
                });
                self.ui.show_toast(ToastRequest::success(target.success_title()));
            }
            RunOutcome::Failed(message) => {
                warn!(episode_id = %self.episode_id, run = %target, error = %message, "Run failed");
                self.fail(target, message.clone());
            }
            RunOutcome::TimedOut => {
                let limit = self.config.max_run().unwrap_or(Duration::ZERO);
                warn!(episode_id = %self.episode_id, run = %target, limit_secs = limit.as_secs(), "Run timed out");
                self.fail(target, format!("No result after {}s", limit.as_secs()));
            }
            RunOutcome::Cancelled => {
                debug!(episode_id = %self.episode_id, run = %target, "Run cancelled");
            }
        }
    }

    fn fail(&self, target: RunTarget, message: String) {
        self.ui.set_progress(GenerationProgress {
            phase: target.name(),
            progress: ProgressValue::Indeterminate,
            status: ProgressStatus::Failed,
            message: Some(message.clone()),
        });
        self.ui
            .show_toast(ToastRequest::error(target.failure_title()).with_message(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_target_titles() {
        let phase = RunTarget::Phase(PhaseId::BeatSheet);
        assert_eq!(phase.started_title(), "Starting Beat Sheet Generation...");
        assert_eq!(
            phase.success_title(),
            "Beat Sheet Generation completed successfully!"
        );
        assert_eq!(phase.failure_title(), "Beat Sheet Generation failed");

        let full = RunTarget::Full(WorkflowKind::Audio);
        assert_eq!(full.started_title(), "Starting full audio generation workflow...");
        assert_eq!(full.success_title(), "Audio generation completed successfully!");
        assert_eq!(full.to_string(), "full-audio");
    }
}
