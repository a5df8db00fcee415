//! Trending topics fetched from the search provider.

use serde::{Deserialize, Serialize};

/// Trend score assigned to a topic whose search timed out.
pub const FALLBACK_TREND_SCORE: u8 = 50;

/// Most topics a session offers; selectors only go from 1 to 4.
pub const MAX_TOPICS: usize = 4;

/// Trend status derived from a topic's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStatus {
    /// Score above 75
    Viral,
    /// Score above 50
    Trending,
    /// Everything else
    Steady,
}

impl TrendStatus {
    /// Classify a 0-100 trend score.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score > 75 {
            Self::Viral
        } else if score > 50 {
            Self::Trending
        } else {
            Self::Steady
        }
    }

    /// Label shown to users.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Viral => "🔥 VIRAL",
            Self::Trending => "📈 TRENDING",
            Self::Steady => "📊 STEADY",
        }
    }
}

impl std::fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A candidate blog topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// The search query this topic was built from.
    pub query: String,

    /// Recent search interest, 0-100.
    pub trend_score: u8,

    /// Link of the top organic result.
    pub source_link: String,

    /// Title of the top organic result.
    pub source_title: String,

    /// Snippet of the top organic result.
    pub snippet: String,

    /// "People Also Ask" questions, in provider order.
    #[serde(default)]
    pub related_questions: Vec<String>,
}

impl Topic {
    /// Create a topic with no search data yet.
    pub fn new(query: impl Into<String>, trend_score: u8) -> Self {
        Self {
            query: query.into(),
            trend_score: trend_score.min(100),
            source_link: String::new(),
            source_title: String::new(),
            snippet: String::new(),
            related_questions: Vec::new(),
        }
    }

    /// Topic used when a query's search does not finish in time.
    pub fn fallback(query: impl Into<String>) -> Self {
        Self::new(query, FALLBACK_TREND_SCORE)
    }

    /// Set the top organic result.
    pub fn with_source(
        mut self,
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        self.source_title = title.into();
        self.source_link = link.into();
        self.snippet = snippet.into();
        self
    }

    /// Set the related questions.
    pub fn with_questions(mut self, questions: Vec<String>) -> Self {
        self.related_questions = questions;
        self
    }

    /// Status derived from the trend score.
    #[must_use]
    pub const fn status(&self) -> TrendStatus {
        TrendStatus::from_score(self.trend_score)
    }

    /// Source link cut to `max` characters for compact listings.
    pub fn short_link(&self, max: usize) -> String {
        if self.source_link.is_empty() {
            return "n/a".to_string();
        }
        let short: String = self.source_link.chars().take(max).collect();
        format!("{short}...")
    }
}
