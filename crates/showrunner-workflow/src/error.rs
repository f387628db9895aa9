//! Error types for showrunner-workflow

use showrunner_core::{PhaseId, WorkflowKind};
use thiserror::Error;

/// Workflow error type
#[derive(Debug, Error)]
pub enum Error {
    /// Another run holds the episode's active lock
    #[error("a run is already active: {active}")]
    Busy {
        /// What is running
        active: String,
    },

    /// Phase belongs to a different workflow than the tracker
    #[error("phase {phase} is not part of the {workflow} workflow")]
    WrongWorkflow {
        /// Requested phase
        phase: PhaseId,
        /// Tracker workflow
        workflow: WorkflowKind,
    },

    /// Audio work needs a generated script first
    #[error("script must be generated before audio production")]
    ScriptRequired,

    /// Tracker was shut down
    #[error("tracker is shut down")]
    ShutDown,

    /// Backend call failed
    #[error(transparent)]
    Api(#[from] showrunner_api::Error),
}

impl Error {
    /// Message suitable for a toast
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy { .. } => "Another generation is already running".to_string(),
            Self::WrongWorkflow { phase, workflow } => {
                format!("{} is not part of {}", phase.name(), workflow.label())
            }
            Self::ScriptRequired => "Script must be generated before audio production".to_string(),
            Self::ShutDown => "This view is closed".to_string(),
            Self::Api(showrunner_api::Error::Unauthorized) => {
                "Your session has expired, please sign in again".to_string()
            }
            Self::Api(showrunner_api::Error::Http { message, .. })
            | Self::Api(showrunner_api::Error::Rejected(message)) => message.clone(),
            Self::Api(e) => e.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            Error::ScriptRequired.user_message(),
            "Script must be generated before audio production"
        );
        let http = Error::from(showrunner_api::Error::Http {
            status: 500,
            message: "Generation backend crashed".to_string(),
        });
        assert_eq!(http.user_message(), "Generation backend crashed");
        let wrong = Error::WrongWorkflow {
            phase: PhaseId::Assembly,
            workflow: WorkflowKind::Script,
        };
        assert!(wrong.user_message().contains("Episode Assembly"));
    }
}
