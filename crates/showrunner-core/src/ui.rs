//! UI state store
//!
//! Process-wide observable state for toast notifications and the single
//! "current generation progress" indicator. The store is an explicitly
//! constructed handle: create one at application start and pass clones to
//! every component that needs it. Observers subscribe through a
//! `tokio::sync::watch` receiver and always see the latest snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default toast lifetime
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
    /// Needs attention
    Warning,
    /// Informational
    Info,
}

/// A toast to be shown. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastRequest {
    /// Severity
    pub kind: ToastKind,
    /// Headline
    pub title: String,
    /// Optional body text
    pub message: Option<String>,
    /// Lifetime; the store default applies when `None` or zero
    pub duration: Option<Duration>,
}

impl ToastRequest {
    /// Create a toast with a title only
    #[must_use]
    pub fn new(kind: ToastKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: None,
            duration: None,
        }
    }

    /// Success toast
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, title)
    }

    /// Error toast
    #[must_use]
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, title)
    }

    /// Warning toast
    #[must_use]
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Warning, title)
    }

    /// Info toast
    #[must_use]
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(ToastKind::Info, title)
    }

    /// Attach body text
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Override lifetime
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A toast currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Store-assigned identifier
    pub id: String,
    /// Severity
    pub kind: ToastKind,
    /// Headline
    pub title: String,
    /// Optional body text
    pub message: Option<String>,
    /// Effective lifetime
    pub duration: Duration,
    /// When the toast was shown
    pub created_at: DateTime<Utc>,
}

/// Progress percentage, or indeterminate when the backend gives none
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressValue {
    /// Spinner / striped bar; no number is shown
    Indeterminate,
    /// Clamped to 0-100
    Percent(f64),
}

impl ProgressValue {
    /// Clamp a raw percentage into range. Non-finite input is indeterminate.
    #[must_use]
    pub fn percent(raw: f64) -> Self {
        if raw.is_finite() {
            Self::Percent(raw.clamp(0.0, 100.0))
        } else {
            Self::Indeterminate
        }
    }

    /// Percentage when known, indeterminate otherwise
    #[must_use]
    pub fn from_reported(raw: Option<f64>) -> Self {
        raw.map_or(Self::Indeterminate, Self::percent)
    }

    /// Rounded percentage for display, `None` when indeterminate
    #[must_use]
    pub fn display(&self) -> Option<u8> {
        match self {
            Self::Indeterminate => None,
            Self::Percent(value) => Some(value.round() as u8),
        }
    }
}

/// Lifecycle of the tracked generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStatus {
    /// Nothing running yet
    #[default]
    Pending,
    /// Running
    InProgress,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

/// Snapshot of the current generation progress
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProgress {
    /// Phase label
    pub phase: String,
    /// Percentage or indeterminate
    pub progress: ProgressValue,
    /// Lifecycle
    pub status: ProgressStatus,
    /// Optional message
    pub message: Option<String>,
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self {
            phase: String::new(),
            progress: ProgressValue::Percent(0.0),
            status: ProgressStatus::Pending,
            message: None,
        }
    }
}

/// Full observable UI state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    /// Toasts in display order
    pub toasts: Vec<Toast>,
    /// Current generation progress
    pub progress: GenerationProgress,
    /// Whether a generation is in flight
    pub is_generating: bool,
}

/// Shared handle to the UI state
#[derive(Debug, Clone)]
pub struct UiStore {
    state: Arc<watch::Sender<UiState>>,
    default_duration: Duration,
}

impl UiStore {
    /// Create an empty store with the default toast lifetime
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_TOAST_DURATION)
    }

    /// Create an empty store with a custom default toast lifetime
    #[must_use]
    pub fn with_default_duration(default_duration: Duration) -> Self {
        let (state, _) = watch::channel(UiState::default());
        Self {
            state: Arc::new(state),
            default_duration,
        }
    }

    /// Observe state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    /// Clone of the current state
    #[must_use]
    pub fn snapshot(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Current toasts
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.state.borrow().toasts.clone()
    }

    /// Show a toast and schedule its removal. Returns the assigned id.
    ///
    /// Removal needs a Tokio runtime; outside one the toast stays until it is
    /// dismissed explicitly.
    pub fn show_toast(&self, request: ToastRequest) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let duration = match request.duration {
            Some(d) if !d.is_zero() => d,
            _ => self.default_duration,
        };

        debug!(toast_id = %id, title = %request.title, "Showing toast");
        let toast = Toast {
            id: id.clone(),
            kind: request.kind,
            title: request.title,
            message: request.message,
            duration,
            created_at: Utc::now(),
        };
        self.state.send_modify(|state| state.toasts.push(toast));

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                let expired = id.clone();
                handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    store.remove_toast(&expired);
                });
            }
            Err(_) => warn!(toast_id = %id, "No runtime available, toast will not auto-expire"),
        }

        id
    }

    /// Remove a toast. Unknown ids are ignored.
    pub fn remove_toast(&self, id: &str) {
        self.state.send_if_modified(|state| {
            let before = state.toasts.len();
            state.toasts.retain(|t| t.id != id);
            state.toasts.len() != before
        });
    }

    /// Remove every toast
    pub fn clear_toasts(&self) {
        self.state.send_if_modified(|state| {
            let had_any = !state.toasts.is_empty();
            state.toasts.clear();
            had_any
        });
    }

    /// Overwrite the progress snapshot
    pub fn set_progress(&self, progress: GenerationProgress) {
        self.state.send_modify(|state| state.progress = progress);
    }

    /// Overwrite the in-flight flag
    pub fn set_generating(&self, generating: bool) {
        self.state.send_modify(|state| state.is_generating = generating);
    }

    /// Current progress snapshot
    #[must_use]
    pub fn progress(&self) -> GenerationProgress {
        self.state.borrow().progress.clone()
    }

    /// Current in-flight flag
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.state.borrow().is_generating
    }
}

impl Default for UiStore {
    fn default() -> Self {
        Self::new()
    }
}
