//! Client for the X (Twitter) v2 posts API
use crate::config::{Config, MAX_TRENDING_LIMIT};
use crate::models::Post;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Smallest page the search endpoint accepts
pub const MIN_SEARCH_RESULTS: u32 = 10;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to posts API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Posts API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Post {id} not found: {detail}")]
    NotFound { id: String, detail: String },

    #[error("Malformed response from posts API: {0}")]
    Malformed(String),

    #[error("Could not extract a post id from '{0}'")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostFetcher: Send + Sync {
    /// Recent posts matching the configured query, at most `limit` of them
    async fn fetch_trending(&self, limit: u32) -> Result<Vec<Post>>;

    /// The post a URL points at (its last path segment is the id)
    async fn fetch_by_url(&self, url: &str) -> Result<Post>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Vec<Post>>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    data: Option<Post>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl ApiError {
    fn describe(&self) -> String {
        match (&self.title, &self.detail) {
            (_, Some(detail)) => detail.clone(),
            (Some(title), None) => title.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

pub struct XApiClient {
    client: Client,
    base_url: Url,
    bearer_token: String,
    trending_query: String,
    search_timeout: Duration,
    lookup_timeout: Duration,
}

impl XApiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.x_api_base_url)
            .map_err(|_| FetchError::InvalidUrl(config.x_api_base_url.clone()))?;

        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            bearer_token: config.x_bearer_token.clone(),
            trending_query: config.trending_query.clone(),
            search_timeout: config.search_timeout(),
            lookup_timeout: config.lookup_timeout(),
        })
    }

    /// `{base}/seg/seg...`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Pass 2xx responses through, turn anything else into `FetchError::Upstream`
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(FetchError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PostFetcher for XApiClient {
    async fn fetch_trending(&self, limit: u32) -> Result<Vec<Post>> {
        let max_results = limit.clamp(MIN_SEARCH_RESULTS, MAX_TRENDING_LIMIT);
        let url = self.endpoint(&["tweets", "search", "recent"])?;

        tracing::debug!(query = %self.trending_query, max_results, "Searching recent posts");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", self.trending_query.as_str()),
                ("max_results", max_results.to_string().as_str()),
                ("tweet.fields", "text,id"),
            ])
            .timeout(self.search_timeout)
            .send()
            .await?;

        let bytes = Self::check_status(response).await?.bytes().await?;
        let parsed: SearchResponse =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed(e.to_string()))?;

        let mut posts = parsed.data.unwrap_or_default();
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn fetch_by_url(&self, post_url: &str) -> Result<Post> {
        let id = extract_post_id(post_url)
            .ok_or_else(|| FetchError::InvalidUrl(post_url.to_string()))?;
        let url = self.endpoint(&["tweets", id.as_str()])?;

        tracing::debug!(post_id = %id, "Looking up post");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(&[("tweet.fields", "text")])
            .timeout(self.lookup_timeout)
            .send()
            .await?;

        let response = match Self::check_status(response).await {
            Ok(response) => response,
            // Unknown ids are a 404; ids the API cannot parse are a 400
            Err(FetchError::Upstream { status, body })
                if status == StatusCode::NOT_FOUND.as_u16()
                    || status == StatusCode::BAD_REQUEST.as_u16() =>
            {
                return Err(FetchError::NotFound { id, detail: body });
            }
            Err(e) => return Err(e),
        };

        let bytes = response.bytes().await?;
        let parsed: LookupResponse =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed(e.to_string()))?;

        match parsed.data {
            Some(post) => Ok(post),
            // Missing posts come back as 200 with an `errors` array
            None if !parsed.errors.is_empty() => Err(FetchError::NotFound {
                id,
                detail: parsed
                    .errors
                    .iter()
                    .map(ApiError::describe)
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
            None => Err(FetchError::Malformed("missing data field".to_string())),
        }
    }
}

/// Post id from a post URL: the last path segment, ignoring trailing
/// slashes, query string and fragment. A bare id is returned as is.
pub fn extract_post_id(post_url: &str) -> Option<String> {
    let trimmed = post_url.trim();
    let path = match Url::parse(trimmed) {
        Ok(url) => url.path().to_string(),
        Err(_) => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
