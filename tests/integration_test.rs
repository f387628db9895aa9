//! End-to-end: tracker, realtime client and rooms over in-memory transports

use async_trait::async_trait;
use serde_json::json;
use showrunner_api::{
    ActionAck, AudioStatus, EpisodeAction, EpisodeApi, Error as ApiError, Result as ApiResult,
    ScriptStatus,
};
use showrunner_core::{Episode, PhaseId, ProgressValue, ToastKind, UiStore, WorkflowKind};
use showrunner_realtime::{
    ClientFrame, Connection, RealtimeClient, RealtimeConfig, RealtimeConnector,
    Result as RealtimeResult, ServerFrame,
};
use showrunner_workflow::{PhaseStatus, RunOutcome, WorkflowConfig, WorkflowTracker};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_test::assert_ok;

/// Backend whose actions never answer; completion arrives by push only
struct SilentBackend {
    assets_generated: Mutex<bool>,
}

#[async_trait]
impl EpisodeApi for SilentBackend {
    async fn get_episode(&self, id: &str) -> ApiResult<Episode> {
        let assets = *self.assets_generated.lock().unwrap();
        Ok(serde_json::from_value(json!({
            "id": id,
            "script_generated": "true",
            "assets_generated": assets,
        }))
        .unwrap())
    }

    async fn run_action(&self, _id: &str, _action: &EpisodeAction) -> ApiResult<ActionAck> {
        std::future::pending().await
    }

    async fn script_status(&self, _id: &str) -> ApiResult<ScriptStatus> {
        Err(ApiError::Network("unreachable".to_string()))
    }

    async fn audio_status(&self, _id: &str) -> ApiResult<AudioStatus> {
        let assets = *self.assets_generated.lock().unwrap();
        Ok(serde_json::from_value(json!({
            "phases": {
                "phase_1_manifest": { "completed": true, "voice_mappings": { "Ada": "v1" } },
                "phase_2_files": { "completed": assets },
                "phase_3_assembly": { "completed": assets, "duration_seconds": 1290.0 },
            }
        }))
        .unwrap())
    }
}

struct Peer {
    frames: mpsc::Receiver<ClientFrame>,
    events: mpsc::Sender<ServerFrame>,
}

struct LoopbackConnector {
    peers: mpsc::UnboundedSender<Peer>,
}

#[async_trait]
impl RealtimeConnector for LoopbackConnector {
    async fn connect(&self, _url: &str) -> RealtimeResult<Connection> {
        let (outbound, frames) = mpsc::channel(16);
        let (events, inbound) = mpsc::channel(16);
        let _ = self.peers.send(Peer { frames, events });
        Ok(Connection { outbound, inbound })
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn drain(peer: &mut Peer) -> Vec<ClientFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = peer.frames.try_recv() {
        frames.push(frame);
    }
    frames
}

#[tokio::test(start_paused = true)]
async fn test_audio_workflow_completes_over_realtime() {
    let (peers, mut accepted) = mpsc::unbounded_channel();
    let realtime = RealtimeClient::new(
        RealtimeConfig::new("ws://backend.test/ws"),
        Arc::new(LoopbackConnector { peers }),
    );
    let backend = Arc::new(SilentBackend {
        assets_generated: Mutex::new(false),
    });
    let ui = UiStore::with_default_duration(Duration::from_secs(3600));
    let tracker = WorkflowTracker::new(
        "ep-42",
        WorkflowKind::Audio,
        Arc::clone(&backend) as Arc<dyn EpisodeApi>,
        ui.clone(),
        WorkflowConfig::default(),
    );

    tracker.attach(&realtime);
    let mut peer = accepted.recv().await.unwrap();
    settle().await;
    assert!(realtime.is_connected());

    assert_ok!(tracker.load().await);
    assert_eq!(tracker.status(PhaseId::Manifest), PhaseStatus::Completed);
    assert_eq!(tracker.status(PhaseId::Files), PhaseStatus::Pending);

    let run = assert_ok!(tracker.run_phase(PhaseId::Files).await);
    assert_eq!(drain(&mut peer), vec![ClientFrame::join("ep-42")]);

    peer.events
        .send(ServerFrame::new(
            "progress",
            json!({"episodeId": "ep-42", "phase": "Audio File Generation", "progress": 55}),
        ))
        .await
        .unwrap();
    settle().await;
    assert_eq!(ui.progress().progress, ProgressValue::Percent(55.0));

    *backend.assets_generated.lock().unwrap() = true;
    peer.events
        .send(ServerFrame::new(
            "status",
            json!({"episodeId": "ep-42", "status": "completed"}),
        ))
        .await
        .unwrap();

    assert_eq!(run.wait().await, RunOutcome::Completed);
    assert_eq!(tracker.status(PhaseId::Files), PhaseStatus::Completed);
    assert_eq!(tracker.status(PhaseId::Assembly), PhaseStatus::Completed);
    let successes: Vec<_> = ui
        .toasts()
        .into_iter()
        .filter(|t| t.kind == ToastKind::Success)
        .map(|t| t.title)
        .collect();
    assert_eq!(
        successes,
        vec!["Audio File Generation completed successfully!".to_string()]
    );

    tracker.shutdown();
    assert_eq!(drain(&mut peer), vec![ClientFrame::leave("ep-42")]);
    assert!(!realtime.registry().has_kind(showrunner_core::EventKind::Status));
}
