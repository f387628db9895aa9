//! Detailed workflow status and audit payloads
//!
//! `script-status` and `audio-status` return a `phases` object keyed by
//! `phase_{n}_{name}`. Every entry carries a `completed` flag plus
//! phase-specific detail. Missing entries mean "not completed".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use showrunner_core::{flag, PhaseId, WorkflowKind};

/// Completion flag plus whatever else the backend attached
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseCompletion {
    /// Whether the phase output exists
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub completed: bool,
    /// Unmodelled detail
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

/// Script workflow phases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptPhases {
    /// Beat sheet
    #[serde(default)]
    pub phase_1_beat_sheet: Option<PhaseCompletion>,
    /// Scenes
    #[serde(default)]
    pub phase_2_scenes: Option<PhaseCompletion>,
    /// Editorial
    #[serde(default)]
    pub phase_3_editorial: Option<PhaseCompletion>,
    /// Teleplay
    #[serde(default)]
    pub phase_4_teleplay: Option<PhaseCompletion>,
}

/// Response of `GET /episodes/{id}/script-status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptStatus {
    /// Per-phase status
    #[serde(default)]
    pub phases: ScriptPhases,
}

/// Generated-count block used by the files phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FileCount {
    /// Files produced so far
    #[serde(default)]
    pub generated: u32,
}

/// Audio manifest phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestPhase {
    /// Whether the manifest exists
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub completed: bool,
    /// Character name to voice id
    #[serde(default)]
    pub voice_mappings: Option<Map<String, Value>>,
}

/// Audio files phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesPhase {
    /// Whether all files exist
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub completed: bool,
    /// Dialogue lines rendered
    #[serde(default)]
    pub dialogue_files: Option<FileCount>,
    /// Sound effects rendered
    #[serde(default)]
    pub sfx_files: Option<FileCount>,
    /// Total files generated
    #[serde(default)]
    pub generated: Option<u32>,
    /// Total files expected
    #[serde(default)]
    pub total_files: Option<u32>,
}

/// Audio assembly phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyPhase {
    /// Whether the final mix exists
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub completed: bool,
    /// Length of the assembled episode
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// Audio workflow phases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioPhases {
    /// Manifest
    #[serde(default)]
    pub phase_1_manifest: Option<ManifestPhase>,
    /// Files
    #[serde(default)]
    pub phase_2_files: Option<FilesPhase>,
    /// Assembly
    #[serde(default)]
    pub phase_3_assembly: Option<AssemblyPhase>,
}

/// Response of `GET /episodes/{id}/audio-status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioStatus {
    /// Per-phase status
    #[serde(default)]
    pub phases: AudioPhases,
}

/// Phase-specific progress shown under a phase card
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseProgressDetail {
    /// Manifest: number of characters with a voice
    VoiceMappings {
        /// Mapped characters
        characters: usize,
    },
    /// Files: generated counts
    Files {
        /// Dialogue files generated
        dialogue: Option<u32>,
        /// SFX files generated
        sfx: Option<u32>,
        /// Overall generated
        generated: u32,
        /// Overall expected
        total: Option<u32>,
    },
    /// Assembly: runtime of the finished episode
    Duration {
        /// Seconds
        seconds: f64,
    },
}

impl PhaseProgressDetail {
    /// Human-readable lines
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::VoiceMappings { characters } => {
                vec![format!("Voice mappings: {characters} characters")]
            }
            Self::Files {
                dialogue,
                sfx,
                generated,
                total,
            } => {
                let mut lines = Vec::new();
                if let Some(n) = dialogue {
                    lines.push(format!("Dialogue files: {n} generated"));
                }
                if let Some(n) = sfx {
                    lines.push(format!("SFX files: {n} generated"));
                }
                if let Some(total) = total.filter(|t| *t > 0) {
                    lines.push(format!("Total: {generated} / {total} files"));
                }
                lines
            }
            Self::Duration { seconds } => {
                vec![format!(
                    "Episode duration: {} minutes",
                    (seconds / 60.0).round() as u64
                )]
            }
        }
    }
}

/// Detailed status for either workflow
#[derive(Debug, Clone, PartialEq)]
pub enum DetailedStatus {
    /// Script workflow
    Script(ScriptStatus),
    /// Audio workflow
    Audio(AudioStatus),
}

impl DetailedStatus {
    /// Workflow this payload describes
    #[must_use]
    pub fn workflow(&self) -> WorkflowKind {
        match self {
            Self::Script(_) => WorkflowKind::Script,
            Self::Audio(_) => WorkflowKind::Audio,
        }
    }

    /// Whether the backend reports `phase` as completed.
    ///
    /// Phases of the other workflow are never completed here.
    #[must_use]
    pub fn is_phase_completed(&self, phase: PhaseId) -> bool {
        match (self, phase) {
            (Self::Script(s), PhaseId::BeatSheet) => completed(&s.phases.phase_1_beat_sheet),
            (Self::Script(s), PhaseId::Scenes) => completed(&s.phases.phase_2_scenes),
            (Self::Script(s), PhaseId::Editorial) => completed(&s.phases.phase_3_editorial),
            (Self::Script(s), PhaseId::Teleplay) => completed(&s.phases.phase_4_teleplay),
            (Self::Audio(a), PhaseId::Manifest) => {
                a.phases.phase_1_manifest.as_ref().is_some_and(|p| p.completed)
            }
            (Self::Audio(a), PhaseId::Files) => {
                a.phases.phase_2_files.as_ref().is_some_and(|p| p.completed)
            }
            (Self::Audio(a), PhaseId::Assembly) => {
                a.phases.phase_3_assembly.as_ref().is_some_and(|p| p.completed)
            }
            _ => false,
        }
    }

    /// Progress detail for `phase`, when the payload carries any
    #[must_use]
    pub fn detail(&self, phase: PhaseId) -> Option<PhaseProgressDetail> {
        let Self::Audio(audio) = self else {
            return None;
        };
        match phase {
            PhaseId::Manifest => {
                let mappings = audio.phases.phase_1_manifest.as_ref()?.voice_mappings.as_ref()?;
                Some(PhaseProgressDetail::VoiceMappings {
                    characters: mappings.len(),
                })
            }
            PhaseId::Files => {
                let files = audio.phases.phase_2_files.as_ref()?;
                Some(PhaseProgressDetail::Files {
                    dialogue: files.dialogue_files.map(|c| c.generated),
                    sfx: files.sfx_files.map(|c| c.generated),
                    generated: files.generated.unwrap_or(0),
                    total: files.total_files,
                })
            }
            PhaseId::Assembly => {
                let seconds = audio.phases.phase_3_assembly.as_ref()?.duration_seconds?;
                Some(PhaseProgressDetail::Duration { seconds })
            }
            _ => None,
        }
    }
}

fn completed(phase: &Option<PhaseCompletion>) -> bool {
    phase.as_ref().is_some_and(|p| p.completed)
}

/// Completeness of one side of an episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSection {
    /// Whether every expected artifact exists
    #[serde(default, alias = "completed", deserialize_with = "flag::deserialize")]
    pub complete: bool,
    /// Artifacts that are missing
    #[serde(default)]
    pub missing: Vec<String>,
}

/// Response of `POST /episodes/{id}/audit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Script completeness
    #[serde(default, alias = "script_status")]
    pub script: AuditSection,
    /// Audio completeness
    #[serde(default, alias = "audio_status")]
    pub audio: AuditSection,
    /// Mismatches between flags and artifacts
    #[serde(default)]
    pub inconsistencies: Vec<String>,
    /// Whether the episode may be finalized
    #[serde(default, alias = "ready_to_finalize", deserialize_with = "flag::deserialize")]
    pub can_finalize: bool,
    /// Unmodelled fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
