//! Phase status state machine

use serde::{Deserialize, Serialize};
use showrunner_api::PhaseProgressDetail;
use showrunner_core::{PhaseId, ProgressValue, WorkflowKind};
use std::fmt;
use thiserror::Error;

/// Status of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Not started
    #[default]
    Pending,
    /// Running
    InProgress,
    /// Finished
    Completed,
    /// Failed; may be re-run
    Error,
}

impl PhaseStatus {
    /// All statuses
    pub const ALL: [Self; 4] = [Self::Pending, Self::InProgress, Self::Completed, Self::Error];

    /// Whether a run may move a phase from `self` to `next`.
    ///
    /// `pending -> in_progress -> {completed, error}`, and a finished phase may
    /// be regenerated back into `in_progress`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Error)
                | (Self::Completed, Self::InProgress)
                | (Self::Error, Self::InProgress)
        )
    }

    /// Whether a run on this phase has finished
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{phase}: {from} -> {to} is not allowed")]
pub struct InvalidTransition {
    /// Phase
    pub phase: PhaseId,
    /// Current status
    pub from: PhaseStatus,
    /// Requested status
    pub to: PhaseStatus,
}

/// One phase and what is known about it
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseState {
    /// Which phase
    pub id: PhaseId,
    /// Current status
    pub status: PhaseStatus,
    /// Latest pushed progress while running
    pub progress: ProgressValue,
    /// Latest detail from the status endpoint
    pub detail: Option<PhaseProgressDetail>,
}

impl PhaseState {
    fn new(id: PhaseId) -> Self {
        Self {
            id,
            status: PhaseStatus::Pending,
            progress: ProgressValue::Indeterminate,
            detail: None,
        }
    }

    /// Button text for this phase
    #[must_use]
    pub fn action_label(&self) -> &'static str {
        if self.status == PhaseStatus::Completed {
            "Regenerate"
        } else {
            self.id.action_label()
        }
    }
}

/// Ordered phase list of one workflow
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseBoard {
    kind: WorkflowKind,
    phases: Vec<PhaseState>,
}

impl PhaseBoard {
    /// Every phase of `kind`, pending
    #[must_use]
    pub fn new(kind: WorkflowKind) -> Self {
        Self {
            kind,
            phases: kind.phases().iter().copied().map(PhaseState::new).collect(),
        }
    }

    /// Workflow
    #[must_use]
    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    /// Phases in order
    #[must_use]
    pub fn phases(&self) -> &[PhaseState] {
        &self.phases
    }

    /// One phase
    #[must_use]
    pub fn get(&self, id: PhaseId) -> Option<&PhaseState> {
        self.phases.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: PhaseId) -> Option<&mut PhaseState> {
        self.phases.iter_mut().find(|p| p.id == id)
    }

    /// Status of one phase; pending for phases of another workflow
    #[must_use]
    pub fn status(&self, id: PhaseId) -> PhaseStatus {
        self.get(id).map_or(PhaseStatus::Pending, |p| p.status)
    }

    /// Phases currently running
    #[must_use]
    pub fn in_progress(&self) -> Vec<PhaseId> {
        self.phases
            .iter()
            .filter(|p| p.status == PhaseStatus::InProgress)
            .map(|p| p.id)
            .collect()
    }

    /// Apply a run transition
    pub fn transition(&mut self, id: PhaseId, to: PhaseStatus) -> Result<(), InvalidTransition> {
        let Some(phase) = self.get_mut(id) else {
            return Err(InvalidTransition {
                phase: id,
                from: PhaseStatus::Pending,
                to,
            });
        };
        if !phase.status.can_transition_to(to) {
            return Err(InvalidTransition {
                phase: id,
                from: phase.status,
                to,
            });
        }
        phase.status = to;
        phase.progress = match to {
            PhaseStatus::Completed => ProgressValue::Percent(100.0),
            _ => ProgressValue::Indeterminate,
        };
        Ok(())
    }

    /// Record what the backend reports as already done.
    ///
    /// Baseline sync, not a run transition: only pending phases are promoted,
    /// running or failed phases are left alone and nothing is ever demoted.
    pub fn sync_completed(&mut self, id: PhaseId, completed: bool) -> bool {
        match self.get_mut(id) {
            Some(phase) if completed && phase.status == PhaseStatus::Pending => {
                phase.status = PhaseStatus::Completed;
                phase.progress = ProgressValue::Percent(100.0);
                true
            }
            _ => false,
        }
    }

    /// Store the latest pushed progress for a running phase
    pub fn set_progress(&mut self, id: PhaseId, progress: ProgressValue) {
        if let Some(phase) = self.get_mut(id).filter(|p| p.status == PhaseStatus::InProgress) {
            phase.progress = progress;
        }
    }

    /// Store status-endpoint detail
    pub fn set_detail(&mut self, id: PhaseId, detail: Option<PhaseProgressDetail>) {
        if let Some(phase) = self.get_mut(id) {
            phase.detail = detail;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_listed_transitions_are_reachable() {
        let allowed = [
            (PhaseStatus::Pending, PhaseStatus::InProgress),
            (PhaseStatus::InProgress, PhaseStatus::Completed),
            (PhaseStatus::InProgress, PhaseStatus::Error),
            (PhaseStatus::Completed, PhaseStatus::InProgress),
            (PhaseStatus::Error, PhaseStatus::InProgress),
        ];
        for from in PhaseStatus::ALL {
            for to in PhaseStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_board_walk() {
        let mut board = PhaseBoard::new(WorkflowKind::Script);
        assert_eq!(board.phases().len(), 4);
        assert!(board
            .transition(PhaseId::BeatSheet, PhaseStatus::Completed)
            .is_err());

        board
            .transition(PhaseId::BeatSheet, PhaseStatus::InProgress)
            .unwrap();
        assert_eq!(board.in_progress(), vec![PhaseId::BeatSheet]);
        board.set_progress(PhaseId::BeatSheet, ProgressValue::percent(42.0));
        assert_eq!(
            board.get(PhaseId::BeatSheet).unwrap().progress,
            ProgressValue::Percent(42.0)
        );

        board
            .transition(PhaseId::BeatSheet, PhaseStatus::Error)
            .unwrap();
        board
            .transition(PhaseId::BeatSheet, PhaseStatus::InProgress)
            .unwrap();
        board
            .transition(PhaseId::BeatSheet, PhaseStatus::Completed)
            .unwrap();
        assert_eq!(
            board.get(PhaseId::BeatSheet).unwrap().action_label(),
            "Regenerate"
        );
    }

    #[test]
    fn test_foreign_phase_is_rejected() {
        let mut board = PhaseBoard::new(WorkflowKind::Audio);
        let err = board
            .transition(PhaseId::Teleplay, PhaseStatus::InProgress)
            .unwrap_err();
        assert_eq!(err.phase, PhaseId::Teleplay);
    }

    #[test]
    fn test_sync_only_promotes_pending() {
        let mut board = PhaseBoard::new(WorkflowKind::Audio);
        board
            .transition(PhaseId::Files, PhaseStatus::InProgress)
            .unwrap();

        assert!(board.sync_completed(PhaseId::Manifest, true));
        assert!(!board.sync_completed(PhaseId::Files, true));
        assert!(!board.sync_completed(PhaseId::Manifest, false));
        assert!(!board.sync_completed(PhaseId::Assembly, false));

        assert_eq!(board.status(PhaseId::Manifest), PhaseStatus::Completed);
        assert_eq!(board.status(PhaseId::Files), PhaseStatus::InProgress);
        assert_eq!(board.status(PhaseId::Assembly), PhaseStatus::Pending);
    }
}
