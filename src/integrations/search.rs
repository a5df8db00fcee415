//! Search provider integration.
//!
//! Topics come from SerpAPI: the Google engine supplies the top organic
//! result and "People Also Ask" questions, the Google Trends engine
//! supplies the 0-100 interest score.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{SearchConfig, Topic, FALLBACK_TREND_SCORE};

/// Number of most recent trend points averaged into the score.
const TREND_WINDOW: usize = 7;

/// Error type for search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provider did not answer before the deadline.
    #[error("Search timed out")]
    Timeout,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider returned an error.
    #[error("Search API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            // The request URL carries the API key.
            Self::Http(e.without_url().to_string())
        }
    }
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// One organic search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// Everything the search provider knows about a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub organic: Vec<OrganicResult>,
    pub trend_score: u8,
    pub related_questions: Vec<String>,
}

impl SearchResults {
    /// Turn the results for `query` into a topic.
    pub fn into_topic(self, query: &str) -> Topic {
        let top = self.organic.into_iter().next().unwrap_or_default();
        Topic::new(query, self.trend_score)
            .with_source(top.title, top.link, top.snippet)
            .with_questions(self.related_questions)
    }
}

/// Trait for search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`.
    async fn search(&self, query: &str) -> SearchResult<SearchResults>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// SerpAPI client.
pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    /// Create a new client.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> SearchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("soundswap-bot/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: "https://serpapi.com/search.json".to_string(),
        })
    }

    /// Create from configuration.
    pub fn from_config(config: &SearchConfig) -> SearchResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| SearchError::Config("SERPAPI_KEY not set".to_string()))?;
        Ok(Self::new(api_key, config.timeout())?.with_base_url(&config.base_url))
    }

    /// Create with a specific endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> SearchResult<T> {
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SearchError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    async fn trend_score(&self, query: &str) -> SearchResult<u8> {
        let response: TrendsResponse = self
            .get(&[
                ("engine", "google_trends"),
                ("q", query),
                ("data_type", "TIMESERIES"),
                ("date", "now 7-d"),
            ])
            .await?;
        Ok(response.score())
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str) -> SearchResult<SearchResults> {
        let response: GoogleResponse =
            self.get(&[("engine", "google"), ("q", query), ("tbs", "qdr:w")]).await?;

        // Trends are a nice-to-have; the topic is still usable without them.
        let trend_score = match self.trend_score(query).await {
            Ok(score) => score,
            Err(SearchError::Timeout) => return Err(SearchError::Timeout),
            Err(e) => {
                tracing::warn!(query, error = %e, "Trend lookup failed, using neutral score");
                FALLBACK_TREND_SCORE
            }
        };

        Ok(SearchResults {
            organic: response.organic_results,
            trend_score,
            related_questions: response
                .related_questions
                .into_iter()
                .map(|q| q.question)
                .filter(|q| !q.trim().is_empty())
                .collect(),
        })
    }

    fn name(&self) -> &str {
        "serpapi"
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    related_questions: Vec<RelatedQuestion>,
}

#[derive(Debug, Deserialize)]
struct RelatedQuestion {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Default, Deserialize)]
struct TrendsResponse {
    #[serde(default)]
    interest_over_time: InterestOverTime,
}

#[derive(Debug, Default, Deserialize)]
struct InterestOverTime {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    values: Vec<TimelineValue>,
}

#[derive(Debug, Deserialize)]
struct TimelineValue {
    #[serde(default)]
    extracted_value: u32,
}

impl TrendsResponse {
    /// Mean of the most recent points, or the neutral score with no data.
    fn score(&self) -> u8 {
        let points: Vec<u32> = self
            .interest_over_time
            .timeline_data
            .iter()
            .rev()
            .filter_map(|p| p.values.first().map(|v| v.extracted_value))
            .take(TREND_WINDOW)
            .collect();

        if points.is_empty() {
            return FALLBACK_TREND_SCORE;
        }
        let mean = points.iter().sum::<u32>() as f64 / points.len() as f64;
        mean.round().clamp(0.0, 100.0) as u8
    }
}
