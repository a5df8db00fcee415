//! Long-form article and quick draft generation.
//!
//! The provider writes the prose; the section structure is ours. Every
//! organized question becomes exactly one H3, in organizer order, whatever
//! headings the provider chose to emit.

use std::sync::Arc;

use crate::ai::AIProvider;

use super::organizer::organize_questions;
use super::outline::Outline;
use super::topic::Topic;

/// Longest draft delivered in a single message.
pub const DRAFT_LIMIT: usize = 1950;

/// Body used when the provider skipped a question.
const MISSING_ANSWER: &str =
    "The SoundSwap team is still testing this one. Share your own results with the community!";

/// Prompt for a full article built around `questions`.
pub fn blog_prompt(topic: &Topic, outline: &Outline, questions: &[String]) -> String {
    let mut prompt = format!(
        "You are the lead strategist for SoundSwap, a community for independent music producers.\n\
         Write a semantic-SEO blog post in the \"{kind}\" style.\n\n\
         Topic: {query}\n\
         Audience: {audience}\n\
         Tone: {tone}\n\
         SEO Keywords: {keywords}\n\
         Target length: {reading_time}\n",
        kind = outline.kind.label(),
        query = topic.query,
        audience = outline.audience,
        tone = outline.tone,
        keywords = outline.seo_keywords.join(", "),
        reading_time = outline.reading_time,
    );

    if !outline.key_points.is_empty() {
        prompt.push_str("\nCover these points:\n");
        for point in &outline.key_points {
            prompt.push_str(&format!("- {point}\n"));
        }
    }

    prompt.push_str("\nStructure:\n1. A catchy H1 headline.\n2. A short intro paragraph.\n");
    if questions.is_empty() {
        prompt.push_str("3. Two or three H2 sections with actionable takeaways.\n");
    } else {
        prompt.push_str("3. One H3 section per question below, using the question verbatim as the heading:\n");
        for question in questions {
            prompt.push_str(&format!("   ### {question}\n"));
        }
    }
    prompt.push_str("4. A final H2 'The Bottom Line' with a call to action for the SoundSwap community.\n");
    prompt
}

/// Prompt for a quick draft from a message's text.
pub fn draft_prompt(intel: &str) -> String {
    format!(
        "You are the lead copywriter for SoundSwap, a platform for independent music producers.\n\
         Write a punchy, professional 600-word blog post based on this intel:\n\n\
         {intel}\n\n\
         Requirements:\n\
         - Actionable takeaways for producers.\n\
         - Catchy H1, intro, three H2 body sections and a 'Final Verdict' call to action.\n"
    )
}

/// Message delivered for a finished draft.
pub fn draft_message(draft: &str) -> String {
    format!(
        "✍️ **SoundSwap AI Draft Complete:**\n\n{}",
        super::chunk::truncate(draft, DRAFT_LIMIT)
    )
}

#[derive(Debug, Default)]
struct Section {
    level: usize,
    heading: String,
    body: Vec<String>,
}

fn heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 {
        return None;
    }
    let text = trimmed[level..].trim().trim_matches('*').trim();
    Some((level, text.to_string()))
}

fn split_sections(text: &str) -> (Vec<String>, Vec<Section>) {
    let mut preamble = Vec::new();
    let mut sections: Vec<Section> = Vec::new();

    for line in text.lines() {
        if let Some((level, heading)) = heading(line) {
            sections.push(Section { level, heading, body: Vec::new() });
        } else if let Some(section) = sections.last_mut() {
            section.body.push(line.to_string());
        } else {
            preamble.push(line.to_string());
        }
    }
    (preamble, sections)
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_body(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lay out provider text as the final article.
///
/// The H1 is the provider's first H1, else one built from the topic. Each
/// question gets the body of the provider section whose heading matches it,
/// or a placeholder. Remaining H2 sections follow; deeper headings are
/// demoted to bold text.
pub fn assemble_blog(topic: &Topic, outline: &Outline, questions: &[String], text: &str) -> String {
    let (preamble, sections) = split_sections(text);

    let title = sections
        .iter()
        .find(|s| s.level == 1 && !s.heading.is_empty())
        .map(|s| single_line(&s.heading))
        .unwrap_or_else(|| format!("{}: {}", topic.query, outline.kind.label()));

    let mut intro = join_body(&preamble);
    for section in sections.iter().filter(|s| s.level == 1) {
        let body = join_body(&section.body);
        if !body.is_empty() {
            if !intro.is_empty() {
                intro.push_str("\n\n");
            }
            intro.push_str(&body);
        }
    }

    let mut used = vec![false; sections.len()];
    let mut doc = format!("# {title}\n\n");
    if !intro.is_empty() {
        doc.push_str(&intro);
        doc.push_str("\n\n");
    }

    if !questions.is_empty() {
        doc.push_str(&format!("## {}: What Producers Are Asking\n\n", outline.kind.label()));
        for question in questions {
            let wanted = normalize(question);
            let matched = sections
                .iter()
                .enumerate()
                .find(|(i, s)| !used[*i] && s.level > 1 && normalize(&s.heading) == wanted)
                .map(|(i, _)| i);

            let body = match matched {
                Some(i) => {
                    used[i] = true;
                    join_body(&sections[i].body)
                }
                None => String::new(),
            };
            let body = if body.is_empty() { MISSING_ANSWER.to_string() } else { body };
            doc.push_str(&format!("### {}\n\n{}\n\n", single_line(question), body));
        }
    }

    for (i, section) in sections.iter().enumerate() {
        if used[i] || section.level == 1 {
            continue;
        }
        let body = join_body(&section.body);
        if section.level == 2 {
            doc.push_str(&format!("## {}\n\n", section.heading));
        } else if !section.heading.is_empty() {
            doc.push_str(&format!("**{}**\n\n", section.heading));
        }
        if !body.is_empty() {
            doc.push_str(&body);
            doc.push_str("\n\n");
        }
    }

    doc.trim_end().to_string()
}

/// Writes the final article for a topic and outline.
#[derive(Clone)]
pub struct BlogGenerator {
    ai: Arc<dyn AIProvider>,
}

impl BlogGenerator {
    /// Create a generator backed by `ai`.
    pub fn new(ai: Arc<dyn AIProvider>) -> Self {
        Self { ai }
    }

    /// One provider call, no retry.
    pub async fn generate(&self, topic: &Topic, outline: &Outline) -> anyhow::Result<String> {
        let questions = organize_questions(&topic.related_questions);
        let text = self.ai.generate(&blog_prompt(topic, outline, &questions)).await?;
        Ok(assemble_blog(topic, outline, &questions, &text))
    }

    /// Quick draft from free text, cut to [`DRAFT_LIMIT`].
    pub async fn draft(&self, intel: &str) -> anyhow::Result<String> {
        let text = self.ai.generate(&draft_prompt(intel)).await?;
        Ok(super::chunk::truncate(&text, DRAFT_LIMIT))
    }
}
