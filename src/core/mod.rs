//! Core types and functionality for the SoundSwap bot.
//!
//! This module contains the content workflow: topics and their trend
//! status, question ordering, outline and article generation, transient
//! sessions, and the selection state machine that ties them together.

pub mod blog;
pub mod chunk;
mod config;
pub mod organizer;
pub mod outline;
pub mod scout;
pub mod sentiment;
pub mod session;
mod topic;
pub mod workflow;

pub use blog::{BlogGenerator, DRAFT_LIMIT};
pub use chunk::{split_message, DEFAULT_CHUNK_SIZE, DISCORD_MESSAGE_LIMIT};
pub use config::{AiConfig, Config, DiscordConfig, SearchConfig, ServerConfig, SessionConfig};
pub use organizer::{organize_questions, QuestionCategory};
pub use outline::{Outline, OutlineGenerator, OutlineType, OUTLINE_COUNT};
pub use scout::{daily_report, run_daily_scout, ScoutSummary, TopicFetcher};
pub use sentiment::SentimentLabel;
pub use session::{ClaimError, ClaimGuard, Session, SessionStage, SessionStore};
pub use topic::{Topic, TrendStatus, FALLBACK_TREND_SCORE, MAX_TOPICS};
pub use workflow::{
    parse_selector, PendingSelection, Workflow, WorkflowError, WorkflowResult, WorkflowState,
};
