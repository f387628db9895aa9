//! Episode, show and character records
//!
//! These mirror what the backend returns. Lifecycle status is open-ended:
//! anything outside the known set is kept verbatim as [`EpisodeStatus::Other`]
//! and displayed with a neutral tone instead of failing.

use crate::flag;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Episode lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EpisodeStatus {
    /// Not yet started
    #[default]
    Pending,
    /// Backend is working on it
    Processing,
    /// Generation finished
    Completed,
    /// Generation failed
    Failed,
    /// Legacy terminal state, displayed as completed
    Finalized,
    /// Any status the console does not know about
    Other(String),
}

impl EpisodeStatus {
    /// Parse a backend status string. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "finalized" => Self::Finalized,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Finalized => "finalized",
            Self::Other(raw) => raw,
        }
    }

    /// Completed or its finalized alias
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed | Self::Finalized)
    }

    /// Whether this status reports a failure
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Display badge for this status
    #[must_use]
    pub fn badge(&self) -> StatusBadge {
        let (label, tone) = match self {
            Self::Pending => ("Pending".to_string(), BadgeTone::Neutral),
            Self::Processing => ("Processing".to_string(), BadgeTone::Info),
            Self::Completed | Self::Finalized => ("Completed".to_string(), BadgeTone::Success),
            Self::Failed => ("Failed".to_string(), BadgeTone::Danger),
            Self::Other(raw) => (raw.clone(), BadgeTone::Neutral),
        };
        StatusBadge { label, tone }
    }
}

impl fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EpisodeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EpisodeStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Visual tone of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    /// Grey
    Neutral,
    /// Blue
    Info,
    /// Green
    Success,
    /// Red
    Danger,
}

/// Label plus tone, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    /// Text shown to the operator
    pub label: String,
    /// Colour family
    pub tone: BadgeTone,
}

/// Two-state display for the coarse generation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationBadge {
    /// Flag set
    Generated,
    /// Flag unset
    Pending,
}

impl From<bool> for GenerationBadge {
    fn from(generated: bool) -> Self {
        if generated {
            Self::Generated
        } else {
            Self::Pending
        }
    }
}

impl fmt::Display for GenerationBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => f.write_str("Generated"),
            Self::Pending => f.write_str("Pending"),
        }
    }
}

/// Episode record owned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode identifier
    pub id: String,
    /// Owning show
    #[serde(default)]
    pub show_id: String,
    /// Season number
    #[serde(default)]
    pub season_number: u32,
    /// Episode number within the season
    #[serde(default)]
    pub episode_number: u32,
    /// Episode title
    #[serde(default)]
    pub title: String,
    /// Planned air date
    #[serde(default)]
    pub air_date: Option<String>,
    /// One-line summary
    #[serde(default)]
    pub logline: String,
    /// A plot
    #[serde(default)]
    pub a_plot: String,
    /// B plot
    #[serde(default)]
    pub b_plot: String,
    /// Optional C plot
    #[serde(default)]
    pub c_plot: Option<String>,
    /// Theme
    #[serde(default)]
    pub theme: String,
    /// Director credit
    #[serde(default)]
    pub director: Option<String>,
    /// Writer credit
    #[serde(default)]
    pub writer: Option<String>,
    /// Asset folder on the backend
    #[serde(default)]
    pub assets_folder: String,
    /// Lifecycle status
    #[serde(default)]
    pub status: EpisodeStatus,
    /// Coarse script completion flag
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub script_generated: bool,
    /// Coarse audio completion flag
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub assets_generated: bool,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Update timestamp
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Episode {
    /// `S{season}E{episode}` code used in listings
    #[must_use]
    pub fn code(&self) -> String {
        format!("S{}E{}", self.season_number, self.episode_number)
    }

    /// Badge for the script flag
    #[must_use]
    pub fn script_badge(&self) -> GenerationBadge {
        self.script_generated.into()
    }

    /// Badge for the audio flag
    #[must_use]
    pub fn audio_badge(&self) -> GenerationBadge {
        self.assets_generated.into()
    }
}

/// Show record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    /// Show identifier
    pub id: String,
    /// Title
    pub name: String,
    /// Year the show is set in
    #[serde(default)]
    pub year: u32,
    /// Format, e.g. sitcom
    #[serde(default)]
    pub format: String,
    /// Content rating
    #[serde(default)]
    pub content_rating: String,
    /// Social setting
    #[serde(default)]
    pub class_setting: String,
    /// Location
    #[serde(default)]
    pub geographic_setting: String,
    /// Theme
    #[serde(default)]
    pub theme: String,
}

/// Character record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Character identifier
    pub id: String,
    /// Owning show
    #[serde(default)]
    pub show_id: String,
    /// Name
    pub character_name: String,
    /// lead, regular or recurring
    #[serde(default)]
    pub role_type: String,
    /// Archetype
    #[serde(default)]
    pub archetype: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Voice assigned by the audio pipeline
    #[serde(default)]
    pub eleven_voice_id: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total items across all pages
    pub total: u64,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Number of pages
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Build a page, computing `total_pages` from `total` and `limit`
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(u64::from(limit)) as u32;
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn episode_with_flags(script: serde_json::Value, assets: serde_json::Value) -> Episode {
        serde_json::from_value(json!({
            "id": "ep-1",
            "show_id": "show-1",
            "season_number": 1,
            "episode_number": 2,
            "title": "Pilot",
            "status": "pending",
            "script_generated": script,
            "assets_generated": assets,
        }))
        .unwrap()
    }

    #[test]
    fn test_flag_representations_render_identically() {
        let generated = [json!(true), json!("true")];
        let pending = [json!(false), json!("false")];

        for value in generated {
            let ep = episode_with_flags(value.clone(), value);
            assert_eq!(ep.script_badge(), GenerationBadge::Generated);
            assert_eq!(ep.audio_badge().to_string(), "Generated");
        }
        for value in pending {
            let ep = episode_with_flags(value.clone(), value);
            assert_eq!(ep.script_badge(), GenerationBadge::Pending);
            assert_eq!(ep.audio_badge().to_string(), "Pending");
        }
    }

    #[test]
    fn test_status_known_values() {
        assert_eq!(EpisodeStatus::parse("processing"), EpisodeStatus::Processing);
        assert!(EpisodeStatus::parse("finalized").is_completed());
        assert!(EpisodeStatus::parse("failed").is_failed());
    }

    #[test]
    fn test_finalized_displays_as_completed() {
        let badge = EpisodeStatus::Finalized.badge();
        assert_eq!(badge, EpisodeStatus::Completed.badge());
        assert_eq!(badge.tone, BadgeTone::Success);
    }

    #[test]
    fn test_unknown_status_is_verbatim_and_neutral() {
        let ep: Episode =
            serde_json::from_value(json!({"id": "x", "status": "archived"})).unwrap();
        assert_eq!(ep.status, EpisodeStatus::Other("archived".to_string()));
        let badge = ep.status.badge();
        assert_eq!(badge.label, "archived");
        assert_eq!(badge.tone, BadgeTone::Neutral);
        assert_eq!(serde_json::to_value(&ep.status).unwrap(), json!("archived"));
    }

    #[test]
    fn test_page_total_pages() {
        let page: Page<u8> = Page::new(vec![], 21, 1, 10);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, 1, 0);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.limit, 1);
    }

    #[test]
    fn test_episode_code() {
        let ep = episode_with_flags(json!(false), json!(false));
        assert_eq!(ep.code(), "S1E2");
    }
}
