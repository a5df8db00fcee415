//! Lexicon-based polarity scoring.
//!
//! Each known word carries a polarity in [-1, 1]. Intensifiers scale the
//! next polar word and negations flip it at half strength. The text's
//! polarity is the mean over polar words, 0.0 when none are found.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Score above which text counts as positive.
pub const POSITIVE_THRESHOLD: f64 = 0.2;

/// Score below which text counts as negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.2;

static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("amazing", 0.6),
        ("awesome", 1.0),
        ("beautiful", 0.85),
        ("best", 1.0),
        ("better", 0.5),
        ("breakthrough", 0.6),
        ("clean", 0.37),
        ("clear", 0.1),
        ("creative", 0.5),
        ("easy", 0.43),
        ("effective", 0.6),
        ("empowering", 0.5),
        ("engaging", 0.4),
        ("essential", 0.3),
        ("excellent", 1.0),
        ("exciting", 0.3),
        ("fast", 0.2),
        ("fresh", 0.3),
        ("fun", 0.3),
        ("good", 0.7),
        ("great", 0.8),
        ("happy", 0.8),
        ("helpful", 0.5),
        ("innovative", 0.5),
        ("inspiring", 0.5),
        ("love", 0.5),
        ("perfect", 1.0),
        ("positive", 0.23),
        ("powerful", 0.3),
        ("practical", 0.3),
        ("professional", 0.1),
        ("punchy", 0.3),
        ("rich", 0.38),
        ("simple", 0.2),
        ("smart", 0.21),
        ("strong", 0.43),
        ("success", 0.3),
        ("successful", 0.75),
        ("unique", 0.38),
        ("useful", 0.3),
        ("valuable", 0.5),
        ("wonderful", 1.0),
        ("awful", -1.0),
        ("bad", -0.7),
        ("boring", -1.0),
        ("broken", -0.4),
        ("confusing", -0.3),
        ("costly", -0.3),
        ("difficult", -0.5),
        ("disappointing", -0.6),
        ("expensive", -0.5),
        ("fail", -0.5),
        ("failure", -0.32),
        ("hard", -0.29),
        ("harsh", -0.5),
        ("lose", -0.4),
        ("muddy", -0.4),
        ("negative", -0.3),
        ("noisy", -0.3),
        ("outdated", -0.4),
        ("poor", -0.4),
        ("problem", -0.3),
        ("risk", -0.3),
        ("risky", -0.5),
        ("slow", -0.3),
        ("terrible", -1.0),
        ("threat", -0.4),
        ("ugly", -0.7),
        ("weak", -0.38),
        ("worse", -0.4),
        ("worst", -1.0),
        ("wrong", -0.5),
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    [("very", 1.3), ("really", 1.2), ("extremely", 1.5), ("incredibly", 1.4), ("super", 1.3)]
        .into_iter()
        .collect()
});

const NEGATIONS: [&str; 6] = ["not", "no", "never", "without", "dont", "isnt"];

/// Sentiment label attached to an outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label a polarity score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > POSITIVE_THRESHOLD {
            Self::Positive
        } else if score < NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Upper-case name as shown to users.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Polarity of `text` in [-1, 1].
pub fn polarity(text: &str) -> f64 {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase().replace('\'', ""))
        .collect();

    let mut total = 0.0;
    let mut count = 0usize;
    let mut modifier = 1.0;

    for word in &words {
        if let Some(scale) = INTENSIFIERS.get(word.as_str()) {
            modifier *= scale;
            continue;
        }
        if NEGATIONS.contains(&word.as_str()) {
            modifier *= -0.5;
            continue;
        }
        if let Some(value) = LEXICON.get(word.as_str()) {
            total += (value * modifier).clamp(-1.0, 1.0);
            count += 1;
        }
        modifier = 1.0;
    }

    if count == 0 {
        0.0
    } else {
        (total / count as f64).clamp(-1.0, 1.0)
    }
}

/// Round a score to two decimals.
#[must_use]
pub fn round2(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_without_polar_words() {
        assert!(polarity("compressor attack release ratio").abs() < f64::EPSILON);
        assert!(polarity("").abs() < f64::EPSILON);
    }

    #[test]
    fn test_positive_text() {
        let score = polarity("An awesome and creative guide with great results");
        assert!(score > POSITIVE_THRESHOLD);
        assert_eq!(SentimentLabel::from_score(score), SentimentLabel::Positive);
    }

    #[test]
    fn test_negative_text() {
        let score = polarity("A terrible, muddy and boring mix");
        assert!(score < NEGATIVE_THRESHOLD);
        assert_eq!(SentimentLabel::from_score(score), SentimentLabel::Negative);
    }

    #[test]
    fn test_negation_flips() {
        assert!(polarity("not good") < 0.0);
        assert!(polarity("good") > 0.0);
    }

    #[test]
    fn test_intensifier_scales_and_clamps() {
        assert!(polarity("very good") > polarity("good"));
        assert!(polarity("extremely perfect") <= 1.0);
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(SentimentLabel::from_score(0.21), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.2), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.2), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.21), SentimentLabel::Negative);
    }

    #[test]
    fn test_round2() {
        assert!((round2(0.456) - 0.46).abs() < 1e-9);
        assert!((round2(-0.333) + 0.33).abs() < 1e-9);
    }
}
