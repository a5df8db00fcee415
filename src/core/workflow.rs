//! Topic → outline → article selection workflow.
//!
//! Each stage is one transition over a [`Session`]. Selections are claimed
//! under the store lock, so a transition either replaces the session
//! wholesale, deletes it, or leaves it untouched. All user-visible output
//! goes through the [`Messenger`] and never fails the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::AIProvider;
use crate::integrations::discord::{deliver, Delivery, DiscordMessage, Messenger};
use crate::integrations::search::{SearchError, SearchProvider};

use super::blog::{draft_message, BlogGenerator};
use super::chunk::{split_message, truncate_with_ellipsis};
use super::config::Config;
use super::outline::{Outline, OutlineGenerator};
use super::scout::{number_emoji, TopicFetcher};
use super::session::{ClaimError, ClaimGuard, Session, SessionStage, SessionStore};
use super::topic::Topic;

/// Longest error text shown to users.
pub const USER_ERROR_LIMIT: usize = 200;

const TOPICS_COLOR: &str = "#5865F2";
const OUTLINES_COLOR: &str = "#9B59B6";

/// State a session reaches after an operation.
///
/// A token with no session is idle; operations only ever report where they
/// left it. `BlogDelivered` and `Error` are terminal for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    TopicsPresented,
    OutlineOptionsPresented,
    BlogDelivered,
    Error,
}

impl From<SessionStage> for WorkflowState {
    fn from(stage: SessionStage) -> Self {
        match stage {
            SessionStage::TopicsPresented => Self::TopicsPresented,
            SessionStage::OutlineOptionsPresented => Self::OutlineOptionsPresented,
        }
    }
}

/// Workflow error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Session not found. It may have expired, please start over with /blog.")]
    SessionNotFound,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("That selection is already being processed, hang tight.")]
    SelectionInProgress,

    #[error("{provider} timed out after {secs}s")]
    ProviderTimeout { provider: String, secs: u64 },

    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },
}

impl WorkflowError {
    /// Message shown to the user, cut to [`USER_ERROR_LIMIT`] characters.
    pub fn user_message(&self) -> String {
        truncate_with_ellipsis(&format!("❌ {self}"), USER_ERROR_LIMIT)
    }
}

impl From<ClaimError> for WorkflowError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::NotFound => Self::SessionNotFound,
            ClaimError::InFlight => Self::SelectionInProgress,
            ClaimError::Rejected(reason) => Self::InvalidSelection(reason),
        }
    }
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// First characters of a token, safe for logs.
pub fn short_token(token: &str) -> &str {
    token.char_indices().nth(8).map_or(token, |(i, _)| &token[..i])
}

/// Parse a user selector into a zero-based index.
///
/// Accepts `1`-`4` and the keycap emoji `1️⃣`-`4️⃣`.
pub fn parse_selector(input: &str) -> Option<usize> {
    let input = input.trim();
    if let Some(i) = (0..4).find(|i| number_emoji(*i) == input) {
        return Some(i);
    }
    match input {
        "1" => Some(0),
        "2" => Some(1),
        "3" => Some(2),
        "4" => Some(3),
        _ => None,
    }
}

/// A claimed selection waiting to be processed.
#[derive(Debug, Clone)]
pub struct PendingSelection {
    pub session: Session,
    pub stage: SessionStage,
    pub index: usize,
}

impl PendingSelection {
    /// Follow-up status reported while this selection runs.
    pub fn status(&self) -> &'static str {
        match self.stage {
            SessionStage::TopicsPresented => "processing_outlines",
            SessionStage::OutlineOptionsPresented => "generating_blog",
        }
    }
}

/// Drives sessions through the selection stages.
#[derive(Clone)]
pub struct Workflow {
    fetcher: TopicFetcher,
    outlines: OutlineGenerator,
    blog: BlogGenerator,
    ai: Arc<dyn AIProvider>,
    messenger: Arc<dyn Messenger>,
    sessions: Arc<SessionStore>,
    ai_timeout: Duration,
    chunk_size: usize,
}

impl Workflow {
    /// Wire the workflow to its collaborators.
    pub fn new(
        search: Arc<dyn SearchProvider>,
        ai: Arc<dyn AIProvider>,
        messenger: Arc<dyn Messenger>,
        sessions: Arc<SessionStore>,
        config: &Config,
    ) -> Self {
        Self {
            fetcher: TopicFetcher::new(search, &config.search),
            outlines: OutlineGenerator::new(Arc::clone(&ai)),
            blog: BlogGenerator::new(Arc::clone(&ai)),
            ai,
            messenger,
            sessions,
            ai_timeout: config.ai.timeout(),
            chunk_size: config.discord.chunk_size,
        }
    }

    /// Override the per-query search deadline.
    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.fetcher = self.fetcher.with_timeout(timeout);
        self
    }

    /// Override the provider deadline.
    pub fn with_ai_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = timeout;
        self
    }

    /// The session store.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The topic fetcher, shared with the daily scout.
    pub fn fetcher(&self) -> &TopicFetcher {
        &self.fetcher
    }

    /// The messenger.
    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    async fn with_ai_deadline<T, F>(&self, fut: F) -> WorkflowResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let provider = self.ai.name().to_string();
        match tokio::time::timeout(self.ai_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(WorkflowError::Provider { provider, message: e.to_string() }),
            Err(_) => Err(WorkflowError::ProviderTimeout { provider, secs: self.ai_timeout.as_secs() }),
        }
    }

    fn search_error(&self, e: SearchError) -> WorkflowError {
        match e {
            SearchError::Timeout => WorkflowError::ProviderTimeout {
                provider: "search".to_string(),
                secs: self.fetcher.timeout().as_secs(),
            },
            other => WorkflowError::Provider { provider: "search".to_string(), message: other.to_string() },
        }
    }

    async fn send(&self, target: Delivery<'_>, message: &DiscordMessage) {
        deliver(self.messenger.as_ref(), target, message).await;
    }

    async fn fail(&self, target: Delivery<'_>, token: &str, error: &WorkflowError) -> WorkflowState {
        tracing::error!(token = %short_token(token), error = %error, "Workflow stage failed");
        self.send(target, &DiscordMessage::text(error.user_message())).await;
        WorkflowState::Error
    }

    /// Start: fetch today's topics and present them.
    pub async fn start(&self, token: &str) -> WorkflowState {
        tracing::info!(token = %short_token(token), "Starting topic selection");
        let target = Delivery::EditOriginal(token);

        let topics = match self.fetcher.fetch_all().await {
            Ok(topics) => topics,
            Err(e) => return self.fail(target, token, &self.search_error(e)).await,
        };

        let message = topics_message(&topics);
        self.sessions.put(Session::new(token, topics));
        self.send(target, &message).await;
        WorkflowState::TopicsPresented
    }

    /// Start directly at outline choice for a free-text topic.
    pub async fn start_with_topic(&self, token: &str, query: &str) -> WorkflowState {
        tracing::info!(token = %short_token(token), query, "Starting outline generation");
        let target = Delivery::EditOriginal(token);

        let topic = match self.fetcher.fetch_one(query).await {
            Ok(topic) => topic,
            Err(e) => return self.fail(target, token, &self.search_error(e)).await,
        };
        let outlines = match self.with_ai_deadline(self.outlines.generate(&topic)).await {
            Ok(outlines) => outlines,
            Err(e) => return self.fail(target, token, &e).await,
        };

        let message = outlines_message(&topic, &outlines);
        self.sessions.put(Session::new(token, vec![topic]).with_topic_selected(0, outlines.to_vec()));
        self.send(target, &message).await;
        WorkflowState::OutlineOptionsPresented
    }

    /// Claim the session for a selection.
    ///
    /// `expected` pins the stage; `None` accepts whichever stage the session
    /// is in. Nothing is mutated on rejection.
    pub fn begin_selection(
        &self,
        token: &str,
        expected: Option<SessionStage>,
        index: usize,
    ) -> WorkflowResult<PendingSelection> {
        let session = self.sessions.claim(token, |session| {
            let stage = session.stage();
            if expected.is_some_and(|e| e != stage) {
                return Err(format!("nothing to select at this stage ({stage:?})"));
            }
            let available = match stage {
                SessionStage::TopicsPresented => session.topics.len(),
                SessionStage::OutlineOptionsPresented => session.outlines.len(),
            };
            if index >= available {
                return Err(format!("choose a number from 1 to {available}"));
            }
            Ok(())
        })?;

        let stage = session.stage();
        Ok(PendingSelection { session, stage, index })
    }

    /// Claim the session for a raw follow-up reply.
    pub fn begin_followup(&self, token: &str, input: &str) -> WorkflowResult<PendingSelection> {
        let index = parse_selector(input)
            .ok_or_else(|| WorkflowError::InvalidSelection(format!("'{input}' is not 1-4")))?;
        self.begin_selection(token, None, index)
    }

    /// Run a claimed selection to its next state.
    ///
    /// The claim is released if this future unwinds or is dropped before
    /// the session is written.
    pub async fn complete(&self, pending: PendingSelection) -> WorkflowState {
        let claim = self.sessions.claim_guard(pending.session.token.as_str());
        match pending.stage {
            SessionStage::TopicsPresented => {
                self.complete_topic(pending.session, pending.index, claim).await
            }
            SessionStage::OutlineOptionsPresented => {
                self.complete_outline(pending.session, pending.index, claim).await
            }
        }
    }

    /// Select Topic with a zero-based index.
    pub async fn select_topic(&self, token: &str, index: usize) -> WorkflowResult<WorkflowState> {
        let pending = self.begin_selection(token, Some(SessionStage::TopicsPresented), index)?;
        Ok(self.complete(pending).await)
    }

    /// Select Outline with a zero-based index.
    pub async fn select_outline(&self, token: &str, index: usize) -> WorkflowResult<WorkflowState> {
        let pending = self.begin_selection(token, Some(SessionStage::OutlineOptionsPresented), index)?;
        Ok(self.complete(pending).await)
    }

    async fn complete_topic(
        &self,
        session: Session,
        index: usize,
        claim: ClaimGuard<'_>,
    ) -> WorkflowState {
        let token = session.token.clone();
        let target = Delivery::Followup(&token);
        let Some(topic) = session.topics.get(index).cloned() else {
            claim.release();
            return session.stage().into();
        };
        tracing::info!(token = %short_token(&token), query = %topic.query, "Topic selected");

        match self.with_ai_deadline(self.outlines.generate(&topic)).await {
            Ok(outlines) => {
                let message = outlines_message(&topic, &outlines);
                self.sessions.put(session.with_topic_selected(index, outlines.to_vec()));
                claim.settle();
                self.send(target, &message).await;
                WorkflowState::OutlineOptionsPresented
            }
            Err(e) => {
                self.sessions.delete(&token);
                claim.settle();
                self.fail(target, &token, &e).await
            }
        }
    }

    async fn complete_outline(
        &self,
        session: Session,
        index: usize,
        claim: ClaimGuard<'_>,
    ) -> WorkflowState {
        let token = session.token.clone();
        let target = Delivery::Followup(&token);
        let session = session.with_outline_selected(index);
        let (Some(topic), Some(outline)) = (session.selected_topic(), session.selected_outline())
        else {
            claim.release();
            return WorkflowState::OutlineOptionsPresented;
        };
        tracing::info!(token = %short_token(&token), outline = %outline.kind, "Outline selected");

        let result = self.with_ai_deadline(self.blog.generate(topic, outline)).await;
        self.sessions.delete(&token);
        claim.settle();

        match result {
            Ok(article) => {
                self.deliver_article(&token, topic, outline, &article).await;
                WorkflowState::BlogDelivered
            }
            Err(e) => self.fail(target, &token, &e).await,
        }
    }

    async fn deliver_article(&self, token: &str, topic: &Topic, outline: &Outline, article: &str) {
        let chunks = split_message(article, self.chunk_size);
        let header = DiscordMessage::with_title(
            format!("✅ Blog ready: {}", topic.query),
            format!("{} • {} • {} part(s)", outline.kind, outline.reading_time, chunks.len()),
        )
        .success();

        self.send(Delivery::Followup(token), &header).await;
        for chunk in &chunks {
            self.send(Delivery::Followup(token), &DiscordMessage::text(chunk.as_str())).await;
        }
        tracing::info!(token = %short_token(token), chunks = chunks.len(), "Blog delivered");
    }

    /// Draft an article from a message's text.
    pub async fn draft(&self, token: &str, intel: &str) -> WorkflowResult<()> {
        let target = Delivery::EditOriginal(token);
        match self.with_ai_deadline(self.blog.draft(intel)).await {
            Ok(draft) => {
                self.send(target, &DiscordMessage::text(draft_message(&draft))).await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(token = %short_token(token), error = %e, "Draft failed");
                let text = truncate_with_ellipsis(
                    &format!("❌ **Drafting Error:** {e}"),
                    USER_ERROR_LIMIT,
                );
                self.send(target, &DiscordMessage::text(text)).await;
                Err(e)
            }
        }
    }
}

/// Card listing topics to choose from.
pub fn topics_message(topics: &[Topic]) -> DiscordMessage {
    let mut message = DiscordMessage::with_title(
        "🎸 Today's Trending Topics",
        "Reply with **1-4** to pick a topic for your blog.",
    )
    .color(TOPICS_COLOR);

    for (i, topic) in topics.iter().enumerate() {
        message = message.add_field(
            format!("{} {}", number_emoji(i), topic.query.to_uppercase()),
            format!(
                "📊 Trend: {}/100 {}\n🔗 {}",
                topic.trend_score,
                topic.status(),
                topic.short_link(40)
            ),
            false,
        );
    }
    message
}

/// Card listing outlines to choose from.
pub fn outlines_message(topic: &Topic, outlines: &[Outline]) -> DiscordMessage {
    let mut message = DiscordMessage::with_title(
        format!("📝 Outlines for: {}", topic.query),
        "Reply with **1️⃣-4️⃣** to generate the full blog.",
    )
    .color(OUTLINES_COLOR);

    for (i, outline) in outlines.iter().enumerate() {
        let mut value = format!(
            "👥 {}\n🎭 {}\n⏱️ {}\n💬 {} ({:+.2})\n",
            outline.audience,
            outline.tone,
            outline.reading_time,
            outline.sentiment_label.name(),
            outline.sentiment_score
        );
        for point in outline.key_points.iter().take(3) {
            value.push_str(&format!("• {point}\n"));
        }
        value.push_str(&format!("🔑 {}", outline.seo_keywords.join(", ")));
        message = message.add_field(format!("{} {}", number_emoji(i), outline.kind), value, false);
    }
    message
}
