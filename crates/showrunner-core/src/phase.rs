//! Workflow and phase catalog
//!
//! Two workflows exist. `script` runs beat sheet, scenes, editorial and
//! teleplay in that order; `audio` runs manifest, files and assembly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A generation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    /// Script production
    Script,
    /// Audio production
    Audio,
}

const SCRIPT_PHASES: [PhaseId; 4] = [
    PhaseId::BeatSheet,
    PhaseId::Scenes,
    PhaseId::Editorial,
    PhaseId::Teleplay,
];

const AUDIO_PHASES: [PhaseId; 3] = [PhaseId::Manifest, PhaseId::Files, PhaseId::Assembly];

impl WorkflowKind {
    /// Phases in execution order
    #[must_use]
    pub fn phases(self) -> &'static [PhaseId] {
        match self {
            Self::Script => &SCRIPT_PHASES,
            Self::Audio => &AUDIO_PHASES,
        }
    }

    /// Label used in toasts for the umbrella run
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Script => "Script generation",
            Self::Audio => "Audio generation",
        }
    }

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(Self::Script),
            "audio" => Ok(Self::Audio),
            other => Err(format!("unknown workflow '{other}' (expected script or audio)")),
        }
    }
}

/// One phase of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseId {
    /// Scene breakdowns with character and location details
    BeatSheet,
    /// Dialogue with timing and performance data
    Scenes,
    /// Review and consistency fixes
    Editorial,
    /// Teleplay PDF
    Teleplay,
    /// Voice mapping and sound effects catalog
    Manifest,
    /// Dialogue and sound effect files
    Files,
    /// Final mixdown
    Assembly,
}

impl PhaseId {
    /// Owning workflow
    #[must_use]
    pub fn workflow(self) -> WorkflowKind {
        match self {
            Self::BeatSheet | Self::Scenes | Self::Editorial | Self::Teleplay => {
                WorkflowKind::Script
            }
            Self::Manifest | Self::Files | Self::Assembly => WorkflowKind::Audio,
        }
    }

    /// 1-based position within the workflow
    #[must_use]
    pub fn ordinal(self) -> usize {
        self.workflow()
            .phases()
            .iter()
            .position(|p| *p == self)
            .map_or(0, |i| i + 1)
    }

    /// Slug used on the command line and in logs
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::BeatSheet => "beat-sheet",
            Self::Scenes => "scenes",
            Self::Editorial => "editorial",
            Self::Teleplay => "teleplay",
            Self::Manifest => "manifest",
            Self::Files => "files",
            Self::Assembly => "assembly",
        }
    }

    /// Display name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BeatSheet => "Beat Sheet Generation",
            Self::Scenes => "Scene Generation",
            Self::Editorial => "Editorial Pass",
            Self::Teleplay => "Teleplay Generation",
            Self::Manifest => "Audio Manifest",
            Self::Files => "Audio File Generation",
            Self::Assembly => "Episode Assembly",
        }
    }

    /// One-line description
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::BeatSheet => "Create scene breakdowns with character and location details",
            Self::Scenes => "Generate detailed dialogue with timing and performance data",
            Self::Editorial => "Comprehensive review and consistency fixes",
            Self::Teleplay => "Create period-accurate TV script PDF",
            Self::Manifest => "Voice mapping and sound effects catalog",
            Self::Files => "Generate character dialogue and sound effects",
            Self::Assembly => "Assemble final MP3 with timing and effects",
        }
    }

    /// Label of the button that triggers this phase
    #[must_use]
    pub fn action_label(self) -> &'static str {
        match self {
            Self::BeatSheet => "Generate Beat Sheet",
            Self::Scenes => "Generate All Scenes",
            Self::Editorial => "Run Editorial Pass",
            Self::Teleplay => "Generate Teleplay",
            Self::Manifest => "Generate Manifest",
            Self::Files => "Generate Audio Files",
            Self::Assembly => "Assemble Episode",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PhaseId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SCRIPT_PHASES
            .iter()
            .chain(AUDIO_PHASES.iter())
            .copied()
            .find(|p| p.slug() == s)
            .ok_or_else(|| format!("unknown phase '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_ordering() {
        assert_eq!(WorkflowKind::Script.phases().len(), 4);
        assert_eq!(WorkflowKind::Audio.phases().len(), 3);
        assert_eq!(PhaseId::BeatSheet.ordinal(), 1);
        assert_eq!(PhaseId::Teleplay.ordinal(), 4);
        assert_eq!(PhaseId::Assembly.ordinal(), 3);
    }

    #[test]
    fn test_every_phase_belongs_to_its_workflow() {
        for kind in [WorkflowKind::Script, WorkflowKind::Audio] {
            for phase in kind.phases() {
                assert_eq!(phase.workflow(), kind);
            }
        }
    }

    #[test]
    fn test_slug_round_trip() {
        for phase in WorkflowKind::Script
            .phases()
            .iter()
            .chain(WorkflowKind::Audio.phases())
        {
            assert_eq!(phase.slug().parse::<PhaseId>().unwrap(), *phase);
        }
        assert!("mixdown".parse::<PhaseId>().is_err());
        assert_eq!("audio".parse::<WorkflowKind>().unwrap(), WorkflowKind::Audio);
    }
}
