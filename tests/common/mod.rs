//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use soundswap_bot::ai::AIProvider;
use soundswap_bot::core::{Config, SessionStore, Workflow};
use soundswap_bot::integrations::{
    DiscordMessage, MessagingResult, Messenger, SearchError, SearchProvider, SearchResult,
    SearchResults,
};

pub const QUERIES: [&str; 4] = ["ai mastering", "lofi drums", "analog synths", "vocal chains"];

pub const QUESTIONS: [&str; 5] = [
    "How to master a song at home?",
    "Which is the best mastering plugin vs hardware?",
    "Can you use AI to make beats?",
    "What is loudness normalization?",
    "Is mastering necessary for streaming?",
];

/// Search provider answering from a fixed score table.
pub struct FakeSearch {
    scores: HashMap<String, u8>,
    slow: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn new(scores: &[(&str, u8)]) -> Self {
        Self {
            scores: scores.iter().map(|(q, s)| ((*q).to_string(), *s)).collect(),
            slow: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_slow(mut self, query: &str) -> Self {
        self.slow.push(query.to_string());
        self
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str) -> SearchResult<SearchResults> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.slow.iter().any(|q| q == query) {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        let Some(score) = self.scores.get(query) else {
            return Err(SearchError::Api { status: 502, message: format!("no data for {query}") });
        };
        Ok(SearchResults {
            organic: vec![soundswap_bot::integrations::OrganicResult {
                title: format!("{query} explained"),
                link: format!("https://example.com/{}", query.replace(' ', "-")),
                snippet: "snippet".to_string(),
            }],
            trend_score: *score,
            related_questions: QUESTIONS.iter().map(|q| (*q).to_string()).collect(),
        })
    }

    fn name(&self) -> &str {
        "fake-search"
    }
}

/// Generative provider that recognises the outline, article and draft prompts.
pub struct FakeAi {
    pub outline_blocks: usize,
    pub answer_len: usize,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeAi {
    pub fn new() -> Self {
        Self { outline_blocks: 4, answer_len: 200, fail: AtomicBool::new(false), calls: AtomicUsize::new(0) }
    }

    pub fn with_blocks(mut self, blocks: usize) -> Self {
        self.outline_blocks = blocks;
        self
    }

    pub fn with_answer_len(mut self, len: usize) -> Self {
        self.answer_len = len;
        self
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    fn outlines(&self) -> String {
        let names = ["Technical Deep Dive", "Creative Applications", "Industry Impact", "Beginner Guide"];
        let mut text = String::from("Sure! Here you go.\n\n");
        for i in 0..self.outline_blocks {
            text.push_str(&format!(
                "OUTLINE {}: {}\nAudience: Producers #{}\nTone: Excellent and helpful\nKey Points:\n- Point A\n- Point B\nSEO Keywords: mastering, mixing\nReading Time: {} min read\n\n",
                i + 1,
                names[i % names.len()],
                i + 1,
                5 + i
            ));
        }
        text
    }

    fn article(&self) -> String {
        let mut text = String::from("# Mastering in the Age of AI\nEverything changes.\n\n");
        for question in QUESTIONS {
            text.push_str(&format!("### {question}\n{}\n\n", "word ".repeat(self.answer_len / 5)));
        }
        text.push_str("## The Bottom Line\nJoin SoundSwap.");
        text
    }
}

#[async_trait]
impl AIProvider for FakeAi {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("quota exceeded");
        }
        if prompt.contains("blog outlines") {
            Ok(self.outlines())
        } else if prompt.contains("semantic-SEO") {
            Ok(self.article())
        } else {
            Ok("# Draft\nA quick take.".to_string())
        }
    }

    fn name(&self) -> &str {
        "fake-ai"
    }
}

/// Where a recorded message went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Edit(String),
    Followup(String),
    Channel,
}

/// Messenger that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(Sent, DiscordMessage)>>,
}

impl RecordingMessenger {
    pub fn messages(&self) -> Vec<(Sent, DiscordMessage)> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, m)| m.text.clone()).collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn edit_original(&self, token: &str, message: &DiscordMessage) -> MessagingResult<()> {
        self.sent.lock().push((Sent::Edit(token.to_string()), message.clone()));
        Ok(())
    }

    async fn post_followup(&self, token: &str, message: &DiscordMessage) -> MessagingResult<()> {
        self.sent.lock().push((Sent::Followup(token.to_string()), message.clone()));
        Ok(())
    }

    async fn post_channel(&self, message: &DiscordMessage) -> MessagingResult<()> {
        self.sent.lock().push((Sent::Channel, message.clone()));
        Ok(())
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.search.queries = QUERIES.iter().map(|q| (*q).to_string()).collect();
    config
}

pub fn default_scores() -> Vec<(&'static str, u8)> {
    QUERIES.iter().copied().zip([80u8, 60, 40, 20]).collect()
}

pub struct Harness {
    pub workflow: Workflow,
    pub sessions: Arc<SessionStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub ai: Arc<FakeAi>,
    pub search: Arc<FakeSearch>,
}

pub fn harness_with(search: FakeSearch, ai: FakeAi, ttl: Duration) -> Harness {
    let search = Arc::new(search);
    let ai = Arc::new(ai);
    let messenger = Arc::new(RecordingMessenger::default());
    let sessions = Arc::new(SessionStore::new(ttl));
    let workflow = Workflow::new(
        search.clone(),
        ai.clone(),
        messenger.clone(),
        Arc::clone(&sessions),
        &test_config(),
    )
    .with_search_timeout(Duration::from_millis(200))
    .with_ai_timeout(Duration::from_secs(5));

    Harness { workflow, sessions, messenger, ai, search }
}

/// Workflow over arbitrary providers, recording what users would see.
pub fn workflow_with(
    search: Arc<dyn SearchProvider>,
    ai: Arc<dyn AIProvider>,
) -> (Workflow, Arc<RecordingMessenger>) {
    let messenger = Arc::new(RecordingMessenger::default());
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(1800)));
    let workflow = Workflow::new(search, ai, messenger.clone(), sessions, &test_config())
        .with_search_timeout(Duration::from_secs(5))
        .with_ai_timeout(Duration::from_secs(5));
    (workflow, messenger)
}

pub fn harness() -> Harness {
    harness_with(FakeSearch::new(&default_scores()), FakeAi::new(), Duration::from_secs(1800))
}
