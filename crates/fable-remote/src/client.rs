//! # API Client
//!
//! Typed endpoint methods over one injected `reqwest::Client`.
//!
//! The HTTP client is constructor-injected, never a process-wide global, so
//! tests and multi-account setups can run isolated clients side by side.
//! One `ApiClient` call is exactly one HTTP attempt.

use reqwest::RequestBuilder;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::outcome::{self, RemoteOutcome};
use fable_core::{NewReview, Review, StoryDetail, StorySummary, UserProfile};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the Fable backend, e.g. `https://api.fable.example/v1/`.
    /// Must end with a slash so endpoint paths join underneath it.
    pub base_url: Url,

    /// Per-request timeout.
    /// Default: 15 seconds
    pub request_timeout: Duration,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl ApiConfig {
    /// Creates a config for the given base URL.
    pub fn new(base_url: Url) -> Self {
        ApiConfig {
            base_url,
            request_timeout: Duration::from_secs(15),
            user_agent: format!("fable-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// Typed client for the Fable backend API.
///
/// Cloning is cheap; `reqwest::Client` is internally reference-counted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Creates a new API client over an injected HTTP client.
    pub fn new(http: reqwest::Client, config: ApiConfig) -> Self {
        ApiClient { http, config }
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.config.base_url.join(path)
    }

    /// Applies the timeout and User-Agent every request carries.
    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .timeout(self.config.request_timeout)
            .header(reqwest::header::USER_AGENT, self.config.user_agent.as_str())
    }

    fn get(&self, url: Url) -> RequestBuilder {
        debug!(%url, "GET");
        self.prepare(self.http.get(url))
    }

    fn authed(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.bearer_auth(token)
    }

    // -------------------------------------------------------------------------
    // Public catalogue
    // -------------------------------------------------------------------------

    /// Lists published stories, optionally filtered by a search term.
    ///
    /// `GET /stories?search=...&limit=...`
    pub async fn list_stories(
        &self,
        search: Option<&str>,
        limit: u32,
    ) -> RemoteOutcome<Vec<StorySummary>> {
        let mut url = match self.endpoint("stories") {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        {
            let mut query = url.query_pairs_mut();
            if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
                query.append_pair("search", search);
            }
            query.append_pair("limit", &limit.to_string());
        }

        outcome::normalize(self.get(url).send().await).await
    }

    /// Fetches one story with its full page graph.
    ///
    /// `GET /stories/{id}`
    pub async fn get_story(&self, id: &str) -> RemoteOutcome<StoryDetail> {
        let url = match self.endpoint(&format!("stories/{id}")) {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        outcome::normalize(self.get(url).send().await).await
    }

    /// Lists reviews for one story, newest first.
    ///
    /// `GET /stories/{id}/reviews`
    pub async fn list_reviews(&self, story_id: &str) -> RemoteOutcome<Vec<Review>> {
        let url = match self.endpoint(&format!("stories/{story_id}/reviews")) {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        outcome::normalize(self.get(url).send().await).await
    }

    /// Fetches one user's public profile.
    ///
    /// `GET /users/{id}`
    pub async fn get_profile(&self, user_id: &str) -> RemoteOutcome<UserProfile> {
        let url = match self.endpoint(&format!("users/{user_id}")) {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        outcome::normalize(self.get(url).send().await).await
    }

    // -------------------------------------------------------------------------
    // Authenticated
    // -------------------------------------------------------------------------

    /// Submits a review; the backend assigns id and timestamp.
    ///
    /// `POST /stories/{id}/reviews`
    pub async fn submit_review(&self, token: &str, review: &NewReview) -> RemoteOutcome<Review> {
        let url = match self.endpoint(&format!("stories/{}/reviews", review.story_id)) {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        debug!(%url, "POST");
        let request = self
            .authed(self.prepare(self.http.post(url)), token)
            .json(review);
        outcome::normalize(request.send().await).await
    }

    /// Lists the signed-in author's own stories, drafts included.
    ///
    /// `GET /me/stories`
    pub async fn my_stories(&self, token: &str) -> RemoteOutcome<Vec<StorySummary>> {
        let url = match self.endpoint("me/stories") {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        outcome::normalize(self.authed(self.get(url), token).send().await).await
    }

    /// Creates or updates a story with its full page graph. The backend
    /// echoes the canonical saved aggregate.
    ///
    /// `PUT /stories/{id}`
    pub async fn upsert_story(
        &self,
        token: &str,
        detail: &StoryDetail,
    ) -> RemoteOutcome<StoryDetail> {
        let url = match self.endpoint(&format!("stories/{}", detail.story.id)) {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        debug!(%url, "PUT");
        let request = self
            .authed(self.prepare(self.http.put(url)), token)
            .json(detail);
        outcome::normalize(request.send().await).await
    }

    /// Publishes a draft. The backend re-validates and echoes the published
    /// aggregate.
    ///
    /// `POST /stories/{id}/publish`
    pub async fn publish_story(&self, token: &str, story_id: &str) -> RemoteOutcome<StoryDetail> {
        let url = match self.endpoint(&format!("stories/{story_id}/publish")) {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        debug!(%url, "POST");
        let request = self.authed(self.prepare(self.http.post(url)), token);
        outcome::normalize(request.send().await).await
    }

    /// Deletes a story.
    ///
    /// `DELETE /stories/{id}`
    pub async fn delete_story(&self, token: &str, story_id: &str) -> RemoteOutcome<()> {
        let url = match self.endpoint(&format!("stories/{story_id}")) {
            Ok(url) => url,
            Err(err) => return invalid_url(err),
        };
        debug!(%url, "DELETE");
        let request = self.authed(self.prepare(self.http.delete(url)), token);
        outcome::normalize_empty(request.send().await).await
    }
}

/// A base URL that cannot absorb an endpoint path is a configuration bug;
/// surface it as a transport failure rather than panicking.
fn invalid_url<T>(err: url::ParseError) -> RemoteOutcome<T> {
    RemoteOutcome::TransportFailure(crate::outcome::TransportError {
        kind: crate::outcome::TransportKind::Other,
        message: format!("invalid endpoint url: {err}"),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ApiConfig {
        ApiConfig::new(Url::parse("https://api.fable.example/v1/").unwrap())
    }

    #[test]
    fn test_endpoint_joins_under_base() {
        let client = ApiClient::new(reqwest::Client::new(), config());
        let url = client.endpoint("stories/abc/reviews").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.fable.example/v1/stories/abc/reviews"
        );
    }

    #[test]
    fn test_config_builder() {
        let config = config()
            .request_timeout(Duration::from_secs(3))
            .user_agent("fable-test/0.0");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "fable-test/0.0");
    }

    #[test]
    fn test_default_user_agent_names_the_client() {
        assert!(config().user_agent.starts_with("fable-client/"));
    }
}
