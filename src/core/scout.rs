//! Trending topic discovery and the daily scout report.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};

use crate::integrations::discord::{deliver, Delivery, DiscordMessage, Messenger};
use crate::integrations::search::{SearchError, SearchProvider, SearchResult};

use super::chunk::split_message;
use super::config::SearchConfig;
use super::topic::Topic;

/// Pause between report chunks posted to the channel.
pub const CHUNK_PAUSE: Duration = Duration::from_secs(1);

const NUMBER_EMOJI: [&str; 4] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣"];

/// Keycap emoji for a zero-based position, or the plain number past four.
pub fn number_emoji(index: usize) -> String {
    NUMBER_EMOJI.get(index).map_or_else(|| format!("{}.", index + 1), |e| (*e).to_string())
}

/// Fetches topics for the predefined queries.
///
/// Queries run with bounded parallelism and a per-query deadline. A query
/// that misses its deadline yields [`Topic::fallback`] instead of failing
/// the batch. Results keep query order.
#[derive(Clone)]
pub struct TopicFetcher {
    search: Arc<dyn SearchProvider>,
    queries: Vec<String>,
    concurrency: usize,
    timeout: Duration,
}

impl TopicFetcher {
    /// Create a fetcher from the search configuration.
    pub fn new(search: Arc<dyn SearchProvider>, config: &SearchConfig) -> Self {
        Self {
            search,
            queries: config.queries.clone(),
            concurrency: config.max_concurrency.max(1),
            timeout: config.timeout(),
        }
    }

    /// Override the per-query deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-query deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The predefined queries.
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Fetch one topic, falling back on timeout.
    pub async fn fetch_one(&self, query: &str) -> SearchResult<Topic> {
        match tokio::time::timeout(self.timeout, self.search.search(query)).await {
            Ok(Ok(results)) => Ok(results.into_topic(query)),
            Ok(Err(SearchError::Timeout)) | Err(_) => {
                tracing::warn!(
                    query,
                    timeout_secs = self.timeout.as_secs(),
                    "Topic search timed out, using fallback"
                );
                Ok(Topic::fallback(query))
            }
            Ok(Err(e)) => {
                tracing::error!(query, provider = self.search.name(), error = %e, "Topic search failed");
                Err(e)
            }
        }
    }

    /// Fetch every predefined query.
    pub async fn fetch_all(&self) -> SearchResult<Vec<Topic>> {
        let results: Vec<SearchResult<Topic>> = stream::iter(self.queries.clone())
            .map(|query| async move { self.fetch_one(&query).await })
            .buffered(self.concurrency)
            .collect()
            .await;
        results.into_iter().collect()
    }
}

/// Render the daily topic report.
pub fn daily_report(topics: &[Topic], date: NaiveDate) -> String {
    let mut report = format!(
        "🎸 **SOUNDSWAP DAILY TOPICS** ({})\n\n**Choose ONE for today's blog:**\n\n",
        date.format("%Y-%m-%d")
    );

    for (i, topic) in topics.iter().enumerate() {
        report.push_str(&format!(
            "{} **{}**\n   📊 Trend: {}/100 {}\n   🔗 Source: {}\n\n",
            number_emoji(i),
            topic.query.to_uppercase(),
            topic.trend_score,
            topic.status(),
            topic.short_link(40)
        ));
    }

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("**Use `/blog` to generate your semantic SEO blog!**");
    report
}

/// What a scout run delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoutSummary {
    pub topics: usize,
    pub chunks_sent: usize,
    pub timestamp: DateTime<Utc>,
}

/// Post `report` to the channel in chunks. Returns how many were sent.
///
/// Failed chunks are logged and skipped.
pub async fn post_report(
    messenger: &dyn Messenger,
    report: &str,
    chunk_size: usize,
    pause: Duration,
) -> usize {
    let chunks = split_message(report, chunk_size);
    let total = chunks.len();
    let mut sent = 0;

    for (i, chunk) in chunks.iter().enumerate() {
        if deliver(messenger, Delivery::Channel, &DiscordMessage::text(chunk.as_str())).await {
            sent += 1;
        } else {
            tracing::warn!(chunk = i + 1, total, "Skipped report chunk");
        }
        if i + 1 < total && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
    sent
}

/// Fetch today's topics and post the report.
pub async fn run_daily_scout(
    fetcher: &TopicFetcher,
    messenger: &dyn Messenger,
    chunk_size: usize,
    pause: Duration,
) -> SearchResult<ScoutSummary> {
    let topics = fetcher.fetch_all().await?;
    let timestamp = Utc::now();
    let report = daily_report(&topics, timestamp.date_naive());
    let chunks_sent = post_report(messenger, &report, chunk_size, pause).await;

    tracing::info!(topics = topics.len(), chunks_sent, "Daily scout report posted");
    Ok(ScoutSummary { topics: topics.len(), chunks_sent, timestamp })
}
