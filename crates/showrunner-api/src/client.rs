//! HTTP API client

use crate::action::{ActionAck, EpisodeAction};
use crate::config::ApiConfig;
use crate::environment::{EnvironmentMode, ENVIRONMENT_HEADER};
use crate::error::{Error, Result};
use crate::status::{AudioStatus, AuditReport, DetailedStatus, ScriptStatus};
use crate::types::{
    CharacterList, CreateEpisode, Envelope, EpisodeList, EpisodeQuery, EpisodeUpdate,
    GenerateEpisode, GenerateShow, ShowList, ShowQuery, ShowUpdate, DEFAULT_PAGE_SIZE,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use showrunner_core::{Character, Episode, Page, Show, WorkflowKind};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Longest error body echoed into an error message
const MAX_ERROR_BODY: usize = 200;

/// Episode operations the workflow engine depends on
#[async_trait]
pub trait EpisodeApi: Send + Sync {
    /// Fetch one episode
    async fn get_episode(&self, id: &str) -> Result<Episode>;

    /// Trigger a generation action. Resolves when the backend answers,
    /// which may be long after the call or almost immediately.
    async fn run_action(&self, id: &str, action: &EpisodeAction) -> Result<ActionAck>;

    /// Detailed script workflow status
    async fn script_status(&self, id: &str) -> Result<ScriptStatus>;

    /// Detailed audio workflow status
    async fn audio_status(&self, id: &str) -> Result<AudioStatus>;

    /// Detailed status for `kind`
    async fn detailed_status(&self, id: &str, kind: WorkflowKind) -> Result<DetailedStatus> {
        match kind {
            WorkflowKind::Script => self.script_status(id).await.map(DetailedStatus::Script),
            WorkflowKind::Audio => self.audio_status(id).await.map(DetailedStatus::Audio),
        }
    }
}

/// REST client for the backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
    base: Url,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut raw = config.base_url.trim_end_matches('/').to_string();
        raw.push('/');
        let base = Url::parse(&raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;

        // No client-wide timeout: generation actions may legitimately run for minutes.
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "API request");
        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.config.auth_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");

        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Backend rejected credentials");
            return Err(Error::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Http {
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason().unwrap_or("error")),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let builder = self
            .request(Method::GET, path)?
            .query(query)
            .timeout(self.timeout());
        decode(self.send(builder).await?).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self
            .request(method, path)?
            .json(body)
            .timeout(self.timeout());
        decode(self.send(builder).await?).await
    }

    /// List episodes, converting the 1-based page into a backend offset
    #[instrument(skip(self))]
    pub async fn list_episodes(&self, query: &EpisodeQuery) -> Result<Page<Episode>> {
        let list: EpisodeList = self.get_json("episodes", &query.to_pairs()).await?;
        Ok(Page::new(
            list.episodes,
            list.total,
            query.page(),
            list.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }

    /// Create an episode from explicit fields
    pub async fn create_episode(&self, request: &CreateEpisode) -> Result<Episode> {
        self.send_json::<Envelope<Episode>, _>(Method::POST, "episodes", request)
            .await
            .map(Envelope::into_inner)
    }

    /// Create an episode from a prompt
    pub async fn generate_episode(
        &self,
        show_id: &str,
        request: &GenerateEpisode,
    ) -> Result<Episode> {
        let builder = self
            .request(Method::POST, "episodes/generate")?
            .query(&[("show_id", show_id)])
            .json(request);
        decode::<Envelope<Episode>>(self.send(builder).await?)
            .await
            .map(Envelope::into_inner)
    }

    /// Patch episode fields
    pub async fn update_episode(&self, id: &str, update: &EpisodeUpdate) -> Result<Episode> {
        self.send_json::<Envelope<Episode>, _>(Method::PATCH, &format!("episodes/{id}"), update)
            .await
            .map(Envelope::into_inner)
    }

    /// Delete an episode and its assets
    pub async fn delete_episode(&self, id: &str) -> Result<()> {
        let builder = self
            .request(Method::DELETE, &format!("episodes/{id}"))?
            .timeout(self.timeout());
        self.send(builder).await?;
        Ok(())
    }

    /// Reset an episode's generated artifacts
    pub async fn reset_episode(&self, id: &str) -> Result<ActionAck> {
        self.post_ack(&format!("episodes/{id}/reset"), None, Some(self.timeout()))
            .await
    }

    /// Run the completeness audit
    #[instrument(skip(self))]
    pub async fn audit(&self, id: &str) -> Result<AuditReport> {
        let builder = self
            .request(Method::POST, &format!("episodes/{id}/audit"))?
            .timeout(self.timeout());
        decode::<Envelope<AuditReport>>(self.send(builder).await?)
            .await
            .map(Envelope::into_inner)
    }

    /// Move the episode into its terminal state
    #[instrument(skip(self))]
    pub async fn finalize(&self, id: &str) -> Result<ActionAck> {
        self.post_ack(&format!("episodes/{id}/finalize"), None, Some(self.timeout()))
            .await
    }

    /// List shows
    pub async fn list_shows(&self, query: &ShowQuery) -> Result<Page<Show>> {
        let list: ShowList = self.get_json("shows", &query.to_pairs()).await?;
        Ok(Page::new(
            list.shows,
            list.total,
            query.page.unwrap_or(1).max(1),
            list.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }

    /// Fetch one show
    pub async fn get_show(&self, id: &str) -> Result<Show> {
        self.get_json::<Envelope<Show>>(&format!("shows/{id}"), &[])
            .await
            .map(Envelope::into_inner)
    }

    /// Create a show from a prompt
    pub async fn generate_show(&self, request: &GenerateShow) -> Result<Show> {
        self.send_json::<Envelope<Show>, _>(Method::POST, "shows/generate", request)
            .await
            .map(Envelope::into_inner)
    }

    /// Patch show fields
    pub async fn update_show(&self, id: &str, update: &ShowUpdate) -> Result<Show> {
        self.send_json::<Envelope<Show>, _>(Method::PATCH, &format!("shows/{id}"), update)
            .await
            .map(Envelope::into_inner)
    }

    /// Delete a show, cascading to its episodes
    pub async fn delete_show(&self, id: &str) -> Result<()> {
        let builder = self
            .request(Method::DELETE, &format!("shows/{id}"))?
            .timeout(self.timeout());
        self.send(builder).await?;
        Ok(())
    }

    /// Characters of a show
    pub async fn list_characters(&self, show_id: &str) -> Result<Vec<Character>> {
        self.get_json::<Envelope<CharacterList>>(&format!("shows/{show_id}/characters"), &[])
            .await
            .map(|list| list.into_inner().into_vec())
    }

    /// Deployment mode advertised by the backend.
    ///
    /// Never fails: any error reads as [`EnvironmentMode::Test`].
    pub async fn environment_mode(&self) -> EnvironmentMode {
        let builder = match self.request(Method::GET, "") {
            Ok(builder) => builder.timeout(self.timeout()),
            Err(e) => {
                warn!(error = %e, "Failed to build environment probe, defaulting to test mode");
                return EnvironmentMode::Test;
            }
        };
        match builder.send().await {
            Ok(response) => EnvironmentMode::from_header(
                response
                    .headers()
                    .get(ENVIRONMENT_HEADER)
                    .and_then(|v| v.to_str().ok()),
            ),
            Err(e) => {
                warn!(error = %e, "Failed to get environment from API, defaulting to test mode");
                EnvironmentMode::Test
            }
        }
    }

    async fn post_ack(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        timeout: Option<Duration>,
    ) -> Result<ActionAck> {
        let mut builder = self.request(Method::POST, path)?;
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let response = self.send(builder).await?;
        let text = response.text().await?;
        let ack = ActionAck::from_body(&text);
        if ack.is_rejected() {
            return Err(Error::Rejected(
                ack.message.unwrap_or_else(|| "request rejected".to_string()),
            ));
        }
        Ok(ack)
    }
}

#[async_trait]
impl EpisodeApi for ApiClient {
    #[instrument(skip(self))]
    async fn get_episode(&self, id: &str) -> Result<Episode> {
        self.get_json::<Envelope<Episode>>(&format!("episodes/{id}"), &[])
            .await
            .map(Envelope::into_inner)
    }

    #[instrument(skip(self, action), fields(endpoint = action.endpoint()))]
    async fn run_action(&self, id: &str, action: &EpisodeAction) -> Result<ActionAck> {
        self.post_ack(
            &format!("episodes/{id}/{}", action.endpoint()),
            action.body(),
            None,
        )
        .await
    }

    async fn script_status(&self, id: &str) -> Result<ScriptStatus> {
        self.get_json::<Envelope<ScriptStatus>>(&format!("episodes/{id}/script-status"), &[])
            .await
            .map(Envelope::into_inner)
    }

    async fn audio_status(&self, id: &str) -> Result<AudioStatus> {
        self.get_json::<Envelope<AudioStatus>>(&format!("episodes/{id}/audio-status"), &[])
            .await
            .map(Envelope::into_inner)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}

/// Pull a readable message out of an error body
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else if trimmed.chars().count() > MAX_ERROR_BODY {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new(ApiConfig::new("http://localhost:8055/api")).unwrap();
        assert_eq!(
            client.url("episodes/ep-1/audit").unwrap().as_str(),
            "http://localhost:8055/api/episodes/ep-1/audit"
        );
        assert_eq!(
            client.url("/episodes").unwrap().as_str(),
            "http://localhost:8055/api/episodes"
        );
        assert_eq!(client.url("").unwrap().as_str(), "http://localhost:8055/api/");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::new(ApiConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"detail": "Episode not found"}"#, "Not Found"),
            "Episode not found"
        );
        assert_eq!(error_message("", "Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message("plain failure", "x"), "plain failure");
        let long = "x".repeat(500);
        assert!(error_message(&long, "x").ends_with("..."));
    }

    #[tokio::test]
    async fn test_environment_probe_defaults_to_test_when_unreachable() {
        let client = ApiClient::new(ApiConfig::new("http://127.0.0.1:9")).unwrap();
        assert_eq!(client.environment_mode().await, EnvironmentMode::Test);
    }
}
