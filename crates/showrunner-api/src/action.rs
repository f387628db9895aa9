//! Backend generation actions

use serde::Deserialize;
use serde_json::{json, Value};
use showrunner_core::{EpisodeStatus, PhaseId, WorkflowKind};

/// A long-running backend action triggered for one episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeAction {
    /// Script phase 1, optionally steered by a prompt
    GenerateBeatSheet {
        /// Extra direction for the beat sheet
        prompt: Option<String>,
    },
    /// Script phase 2
    GenerateAllScenes,
    /// Script phase 3
    EditorialPass,
    /// Script phase 4
    GenerateTeleplay,
    /// Whole script workflow
    GenerateScript,
    /// Audio phase 1
    GenerateAudioManifest,
    /// Audio phase 2
    GenerateAudioFiles,
    /// Audio phase 3
    AssembleEpisode,
    /// Whole audio workflow
    GenerateFullAudio,
}

impl EpisodeAction {
    /// Action that runs a single phase
    #[must_use]
    pub fn for_phase(phase: PhaseId) -> Self {
        match phase {
            PhaseId::BeatSheet => Self::GenerateBeatSheet { prompt: None },
            PhaseId::Scenes => Self::GenerateAllScenes,
            PhaseId::Editorial => Self::EditorialPass,
            PhaseId::Teleplay => Self::GenerateTeleplay,
            PhaseId::Manifest => Self::GenerateAudioManifest,
            PhaseId::Files => Self::GenerateAudioFiles,
            PhaseId::Assembly => Self::AssembleEpisode,
        }
    }

    /// Umbrella action for a workflow
    #[must_use]
    pub fn full(kind: WorkflowKind) -> Self {
        match kind {
            WorkflowKind::Script => Self::GenerateScript,
            WorkflowKind::Audio => Self::GenerateFullAudio,
        }
    }

    /// Path segment after `/episodes/{id}/`
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::GenerateBeatSheet { .. } => "generate-beat-sheet",
            Self::GenerateAllScenes => "generate-all-scenes",
            Self::EditorialPass => "editorial-pass",
            Self::GenerateTeleplay => "generate-teleplay",
            Self::GenerateScript => "generate-script",
            Self::GenerateAudioManifest => "generate-audio-manifest",
            Self::GenerateAudioFiles => "generate-audio-files",
            Self::AssembleEpisode => "assemble-episode",
            Self::GenerateFullAudio => "generate-full-audio",
        }
    }

    /// JSON body, if the action takes one
    #[must_use]
    pub fn body(&self) -> Option<Value> {
        match self {
            Self::GenerateBeatSheet { prompt: Some(p) } => Some(json!({ "prompt": p })),
            Self::GenerateBeatSheet { prompt: None } => Some(json!({})),
            _ => None,
        }
    }
}

/// Acknowledgement returned by action endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionAck {
    /// Explicit success flag, when the backend sends one
    #[serde(default)]
    pub success: Option<bool>,
    /// Backend message
    #[serde(default)]
    pub message: Option<String>,
    /// Episode status after the call, when reported
    #[serde(default)]
    pub status: Option<EpisodeStatus>,
}

impl ActionAck {
    /// Decode a response body; empty or non-JSON bodies acknowledge silently
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Whether the backend explicitly reported failure
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_endpoints() {
        assert_eq!(
            EpisodeAction::for_phase(PhaseId::Scenes).endpoint(),
            "generate-all-scenes"
        );
        assert_eq!(
            EpisodeAction::for_phase(PhaseId::Assembly).endpoint(),
            "assemble-episode"
        );
        assert_eq!(
            EpisodeAction::full(WorkflowKind::Audio).endpoint(),
            "generate-full-audio"
        );
        assert_eq!(
            EpisodeAction::full(WorkflowKind::Script).endpoint(),
            "generate-script"
        );
    }

    #[test]
    fn test_beat_sheet_body() {
        let with_prompt = EpisodeAction::GenerateBeatSheet {
            prompt: Some("more slapstick".to_string()),
        };
        assert_eq!(with_prompt.body(), Some(json!({"prompt": "more slapstick"})));
        assert_eq!(EpisodeAction::EditorialPass.body(), None);
    }

    #[test]
    fn test_ack_decoding() {
        assert_eq!(ActionAck::from_body(""), ActionAck::default());
        assert_eq!(ActionAck::from_body("accepted"), ActionAck::default());
        let ack = ActionAck::from_body(r#"{"success": false, "message": "busy"}"#);
        assert!(ack.is_rejected());
        assert_eq!(ack.message.as_deref(), Some("busy"));
        assert!(!ActionAck::from_body(r#"{"success": true}"#).is_rejected());
    }
}
