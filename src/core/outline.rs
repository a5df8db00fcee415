//! Blog outlines drafted by the AI provider.
//!
//! The provider is asked for four blocks in a fixed line format:
//!
//! ```text
//! OUTLINE 1: Technical Deep Dive
//! Audience: Mixing engineers
//! Tone: Analytical
//! Key Points:
//! - First point
//! - Second point
//! SEO Keywords: eq, compression, mixing
//! Reading Time: 8 min read
//! ```
//!
//! Parsing is lenient about markdown decoration (`#`, `*`, `**Label:**`).
//! Missing fields and missing blocks are filled from per-type placeholders,
//! so [`OutlineGenerator::generate`] always yields one outline per type.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::organizer::organize_questions;
use super::sentiment::{polarity, round2, SentimentLabel};
use super::topic::Topic;
use crate::ai::AIProvider;

/// Number of outlines offered per topic.
pub const OUTLINE_COUNT: usize = 4;

/// `OUTLINE 2: ...`, `## Outline #3 - ...` or `Outline: ...`. A number or a
/// separator must follow the word, so prose starting with "Outline" is not a header.
static BLOCK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\s#*]*outline\s*(?:#?\s*\d+\s*[:.)\-–]?|[:\-–])\s*(.*)$").unwrap()
});

static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*[-*•]?\s*\**\s*(audience|tone|key\s*points|seo\s*keywords|keywords|reading\s*time)\s*\**\s*:\s*\**\s*(.*)$",
    )
    .unwrap()
});

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$").unwrap());

/// The four outline angles, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutlineType {
    TechnicalDeepDive,
    CreativeApplications,
    IndustryImpact,
    BeginnerGuide,
}

impl OutlineType {
    /// All types in presentation order.
    pub const ALL: [Self; OUTLINE_COUNT] = [
        Self::TechnicalDeepDive,
        Self::CreativeApplications,
        Self::IndustryImpact,
        Self::BeginnerGuide,
    ];

    /// Human readable name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TechnicalDeepDive => "Technical Deep Dive",
            Self::CreativeApplications => "Creative Applications",
            Self::IndustryImpact => "Industry Impact",
            Self::BeginnerGuide => "Beginner Guide",
        }
    }

    /// Detect a type named in a block header.
    pub fn from_header(header: &str) -> Option<Self> {
        let lower = header.to_lowercase();
        if lower.contains("technical") || lower.contains("deep dive") {
            Some(Self::TechnicalDeepDive)
        } else if lower.contains("creative") {
            Some(Self::CreativeApplications)
        } else if lower.contains("industry") {
            Some(Self::IndustryImpact)
        } else if lower.contains("beginner") {
            Some(Self::BeginnerGuide)
        } else {
            None
        }
    }

    fn default_audience(self) -> &'static str {
        match self {
            Self::TechnicalDeepDive => "Experienced producers and audio engineers",
            Self::CreativeApplications => "Producers looking for fresh ideas",
            Self::IndustryImpact => "Artists, labels and music business professionals",
            Self::BeginnerGuide => "New producers getting started",
        }
    }

    fn default_tone(self) -> &'static str {
        match self {
            Self::TechnicalDeepDive => "Analytical",
            Self::CreativeApplications => "Inspiring",
            Self::IndustryImpact => "Informative",
            Self::BeginnerGuide => "Friendly",
        }
    }

    fn default_reading_time(self) -> &'static str {
        match self {
            Self::TechnicalDeepDive => "8 min read",
            Self::CreativeApplications => "6 min read",
            Self::IndustryImpact => "7 min read",
            Self::BeginnerGuide => "5 min read",
        }
    }

    fn default_key_points(self, query: &str) -> Vec<String> {
        match self {
            Self::TechnicalDeepDive => vec![
                format!("How {query} works under the hood"),
                "Settings and signal flow walkthrough".to_string(),
                "Common pitfalls and how to fix them".to_string(),
            ],
            Self::CreativeApplications => vec![
                format!("Unexpected ways to use {query}"),
                "Sound design experiments to try".to_string(),
                "Building a signature sound".to_string(),
            ],
            Self::IndustryImpact => vec![
                format!("Why {query} matters right now"),
                "What it changes for independent artists".to_string(),
                "Where the trend is heading".to_string(),
            ],
            Self::BeginnerGuide => vec![
                format!("What {query} means for new producers"),
                "First steps in your DAW".to_string(),
                "Mistakes to avoid early on".to_string(),
            ],
        }
    }
}

impl std::fmt::Display for OutlineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A typed blog outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    #[serde(rename = "type")]
    pub kind: OutlineType,
    pub audience: String,
    pub tone: String,
    pub key_points: Vec<String>,
    /// Distinct lower-case keywords, in first-seen order.
    pub seo_keywords: Vec<String>,
    pub reading_time: String,
    pub sentiment_label: SentimentLabel,
    /// Polarity rounded to two decimals.
    pub sentiment_score: f64,
}

impl Outline {
    /// Build an outline from a parsed block, filling gaps with placeholders.
    fn from_block(kind: OutlineType, block: Option<OutlineBlock>, topic: &Topic) -> Self {
        let block = block.unwrap_or_default();

        let key_points = if block.key_points.is_empty() {
            kind.default_key_points(&topic.query)
        } else {
            block.key_points
        };

        let seo_keywords = if block.keywords.is_empty() {
            default_keywords(&topic.query)
        } else {
            block.keywords
        };

        let mut outline = Self {
            kind,
            audience: block.audience.unwrap_or_else(|| kind.default_audience().to_string()),
            tone: block.tone.unwrap_or_else(|| kind.default_tone().to_string()),
            key_points,
            seo_keywords,
            reading_time: block
                .reading_time
                .unwrap_or_else(|| kind.default_reading_time().to_string()),
            sentiment_label: SentimentLabel::Neutral,
            sentiment_score: 0.0,
        };

        let score = round2(polarity(&outline.to_text()));
        outline.sentiment_score = score;
        outline.sentiment_label = SentimentLabel::from_score(score);
        outline
    }

    /// Plain text rendering, also the input to sentiment scoring.
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "{}\nAudience: {}\nTone: {}\nKey Points:\n",
            self.kind.label(),
            self.audience,
            self.tone
        );
        for point in &self.key_points {
            text.push_str("- ");
            text.push_str(point);
            text.push('\n');
        }
        text.push_str(&format!(
            "SEO Keywords: {}\nReading Time: {}",
            self.seo_keywords.join(", "),
            self.reading_time
        ));
        text
    }
}

fn default_keywords(query: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    push_keyword(&mut keywords, query);
    push_keyword(&mut keywords, "music production");
    keywords
}

fn push_keyword(keywords: &mut Vec<String>, keyword: &str) {
    let keyword = keyword.trim().trim_matches(|c| c == '*' || c == '#').trim().to_lowercase();
    if !keyword.is_empty() && !keywords.contains(&keyword) {
        keywords.push(keyword);
    }
}

/// Fields read from one outline block. `None`/empty means "not present".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineBlock {
    pub kind_hint: Option<OutlineType>,
    pub audience: Option<String>,
    pub tone: Option<String>,
    pub key_points: Vec<String>,
    pub keywords: Vec<String>,
    pub reading_time: Option<String>,
}

/// Split provider text into outline blocks.
pub fn parse_blocks(text: &str) -> Vec<OutlineBlock> {
    let mut blocks: Vec<OutlineBlock> = Vec::new();
    let mut in_key_points = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let is_bullet = in_key_points && BULLET.is_match(line);
        if let Some(caps) = BLOCK_HEADER.captures(line).filter(|_| !is_bullet) {
            let header = caps.get(1).map_or("", |m| m.as_str());
            blocks.push(OutlineBlock {
                kind_hint: OutlineType::from_header(header),
                ..OutlineBlock::default()
            });
            in_key_points = false;
            continue;
        }

        // Anything before the first block header is preamble.
        let Some(block) = blocks.last_mut() else {
            continue;
        };

        if let Some(caps) = FIELD.captures(line) {
            let label = caps[1].to_lowercase().replace(char::is_whitespace, "");
            let value = clean_value(&caps[2]);
            in_key_points = false;

            match label.as_str() {
                "audience" => block.audience = non_empty(value),
                "tone" => block.tone = non_empty(value),
                "readingtime" => block.reading_time = non_empty(value),
                "seokeywords" | "keywords" => {
                    for keyword in value.split(',') {
                        push_keyword(&mut block.keywords, keyword);
                    }
                }
                "keypoints" => {
                    in_key_points = true;
                    if !value.is_empty() {
                        block.key_points.push(value);
                    }
                }
                _ => {}
            }
            continue;
        }

        if in_key_points {
            if let Some(caps) = BULLET.captures(line) {
                let point = clean_value(&caps[1]);
                if !point.is_empty() {
                    block.key_points.push(point);
                }
            }
        }
    }

    blocks
}

fn clean_value(raw: &str) -> String {
    raw.trim().trim_matches('*').trim().to_string()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Map parsed blocks onto the four fixed types.
///
/// A block whose header names a type takes that slot if still free; other
/// blocks fill the remaining slots in order. Surplus blocks are dropped.
pub fn assign_blocks(blocks: Vec<OutlineBlock>) -> [Option<OutlineBlock>; OUTLINE_COUNT] {
    let mut slots: [Option<OutlineBlock>; OUTLINE_COUNT] = Default::default();
    let mut unplaced = Vec::new();

    for block in blocks {
        let slot = block
            .kind_hint
            .and_then(|kind| OutlineType::ALL.iter().position(|k| *k == kind))
            .filter(|i| slots[*i].is_none());
        match slot {
            Some(i) => slots[i] = Some(block),
            None => unplaced.push(block),
        }
    }

    let mut unplaced = unplaced.into_iter();
    for slot in &mut slots {
        if slot.is_none() {
            *slot = unplaced.next();
        }
    }

    slots
}

/// Build exactly four outlines for `topic` from provider text.
pub fn outlines_from_text(text: &str, topic: &Topic) -> [Outline; OUTLINE_COUNT] {
    let mut slots = assign_blocks(parse_blocks(text)).into_iter();
    OutlineType::ALL.map(|kind| Outline::from_block(kind, slots.next().flatten(), topic))
}

/// Prompt asking the provider for the four outline blocks.
pub fn outline_prompt(topic: &Topic) -> String {
    let questions = organize_questions(&topic.related_questions);
    let questions = if questions.is_empty() {
        "(none)".to_string()
    } else {
        questions.iter().map(|q| format!("- {q}")).collect::<Vec<_>>().join("\n")
    };

    format!(
        r"You are the lead content strategist for SoundSwap, a community for independent music producers.
Draft four distinct blog outlines for the topic below.

Topic: {query}
Trend score: {score}/100 ({status})
Top source: {source}
Reader questions:
{questions}

Write exactly four blocks, in this order: Technical Deep Dive, Creative Applications, Industry Impact, Beginner Guide.
Use this exact format for each block and nothing else:

OUTLINE <n>: <type>
Audience: <who this is for>
Tone: <tone of voice>
Key Points:
- <point>
- <point>
- <point>
SEO Keywords: <keyword>, <keyword>, <keyword>
Reading Time: <minutes> min read",
        query = topic.query,
        score = topic.trend_score,
        status = topic.status().label(),
        source = if topic.source_title.is_empty() { "n/a" } else { &topic.source_title },
    )
}

/// Generates the four outlines for a topic.
#[derive(Clone)]
pub struct OutlineGenerator {
    ai: Arc<dyn AIProvider>,
}

impl OutlineGenerator {
    /// Create a generator backed by `ai`.
    pub fn new(ai: Arc<dyn AIProvider>) -> Self {
        Self { ai }
    }

    /// Ask the provider for outlines and parse them.
    pub async fn generate(&self, topic: &Topic) -> anyhow::Result<[Outline; OUTLINE_COUNT]> {
        let text = self.ai.generate(&outline_prompt(topic)).await?;
        let blocks = parse_blocks(&text).len();
        if blocks < OUTLINE_COUNT {
            tracing::warn!(query = %topic.query, blocks, "Outline text incomplete, using placeholders");
        }
        Ok(outlines_from_text(&text, topic))
    }
}
