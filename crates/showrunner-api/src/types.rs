//! Request and response shapes for the REST surface

use serde::{Deserialize, Serialize};
use showrunner_core::{Character, Episode, Show};

/// Default listing page size
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Episode listing filters. Pages are 1-based; the backend wants offsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeQuery {
    /// Restrict to one show
    pub show_id: Option<String>,
    /// 1-based page (default 1)
    pub page: Option<u32>,
    /// Page size (default 10)
    pub limit: Option<u32>,
    /// Free-text search
    pub search: Option<String>,
    /// Status filter
    pub status: Option<String>,
    /// Season filter
    pub season: Option<u32>,
}

impl EpisodeQuery {
    /// Effective page, at least 1
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, at least 1
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    /// Query-string pairs with the page converted to an offset
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let limit = self.limit();
        let offset = u64::from(self.page() - 1) * u64::from(limit);
        let mut pairs = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(show_id) = &self.show_id {
            pairs.push(("show_id", show_id.clone()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(season) = self.season {
            pairs.push(("season", season.to_string()));
        }
        pairs
    }
}

/// Show listing filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowQuery {
    /// 1-based page (default 1)
    pub page: Option<u32>,
    /// Page size (default 10)
    pub limit: Option<u32>,
    /// Free-text search
    pub search: Option<String>,
}

impl ShowQuery {
    /// Query-string pairs with the page converted to an offset
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page = self.page.unwrap_or(1).max(1);
        let offset = u64::from(page - 1) * u64::from(limit);
        let mut pairs = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

/// Backend listing envelope for episodes
#[derive(Debug, Deserialize)]
pub(crate) struct EpisodeList {
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Backend listing envelope for shows
#[derive(Debug, Deserialize)]
pub(crate) struct ShowList {
    #[serde(default)]
    pub shows: Vec<Show>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Backend listing envelope for characters
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CharacterList {
    Keyed { characters: Vec<Character> },
    Bare(Vec<Character>),
}

impl CharacterList {
    pub(crate) fn into_vec(self) -> Vec<Character> {
        match self {
            Self::Keyed { characters } | Self::Bare(characters) => characters,
        }
    }
}

/// Responses may be wrapped as `{data, success, message}` or sent bare
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Manual episode creation
#[derive(Debug, Clone, Serialize)]
pub struct CreateEpisode {
    /// Owning show
    pub show_id: String,
    /// Season number
    pub season_number: u32,
    /// Episode number
    pub episode_number: u32,
    /// Title
    pub title: String,
    /// One-line summary
    pub logline: String,
    /// A plot
    pub a_plot: String,
    /// B plot
    pub b_plot: String,
    /// Optional C plot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_plot: Option<String>,
    /// Theme
    pub theme: String,
}

/// AI episode creation
#[derive(Debug, Clone, Serialize)]
pub struct GenerateEpisode {
    /// Free-text brief
    pub prompt: String,
    /// Whether this closes the season
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_finale: Option<bool>,
}

/// Partial episode update; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct EpisodeUpdate {
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// One-line summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logline: Option<String>,
    /// A plot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a_plot: Option<String>,
    /// B plot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b_plot: Option<String>,
    /// C plot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_plot: Option<String>,
    /// Theme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Writer credit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    /// Director credit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
}

/// AI show creation
#[derive(Debug, Clone, Serialize)]
pub struct GenerateShow {
    /// Free-text brief
    pub prompt: String,
}

/// Partial show update
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShowUpdate {
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Content rating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_rating: Option<String>,
    /// Theme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}
