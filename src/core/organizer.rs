//! Orders "People Also Ask" questions into a blog narrative.
//!
//! Questions are bucketed by keyword, emitted beginner → creative →
//! technical → comparison with per-bucket caps, then backfilled in input
//! order. The result is used verbatim as the article's H3 headers.

/// Maximum number of questions the organizer emits.
pub const MAX_SECTIONS: usize = 4;

/// Narrative bucket a question falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionCategory {
    /// "How to" style questions
    Beginner,
    /// "Best X vs Y" style questions
    Comparison,
    /// Questions about using or making things
    Creative,
    /// Everything else
    Technical,
}

impl QuestionCategory {
    /// Categories in emission order, with how many questions each may emit.
    const EMISSION_ORDER: [(Self, usize); 4] =
        [(Self::Beginner, 2), (Self::Creative, 2), (Self::Technical, 2), (Self::Comparison, 1)];

    /// Classify a question. Matching is case-insensitive and checks the
    /// buckets in priority order beginner, comparison, creative.
    pub fn classify(question: &str) -> Self {
        let lower = question.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has_any(&["how to", "tutorial", "step by step", "guide"]) {
            Self::Beginner
        } else if has_any(&["best", "vs", "compare", "difference"]) {
            Self::Comparison
        } else if has_any(&["work", "use", "create", "make"]) {
            Self::Creative
        } else {
            Self::Technical
        }
    }
}

/// Pick and order at most four questions for section headers.
pub fn organize_questions<S: AsRef<str>>(questions: &[S]) -> Vec<String> {
    let categories: Vec<QuestionCategory> =
        questions.iter().map(|q| QuestionCategory::classify(q.as_ref())).collect();

    let mut picked: Vec<usize> = Vec::with_capacity(MAX_SECTIONS);
    for (category, cap) in QuestionCategory::EMISSION_ORDER {
        picked.extend(
            categories.iter().enumerate().filter(|(_, c)| **c == category).map(|(i, _)| i).take(cap),
        );
    }

    // Backfill by position so duplicate question texts still count separately.
    if picked.len() < MAX_SECTIONS {
        for i in 0..questions.len() {
            if picked.len() >= MAX_SECTIONS {
                break;
            }
            if !picked.contains(&i) {
                picked.push(i);
            }
        }
    }

    picked.truncate(MAX_SECTIONS);
    picked.into_iter().map(|i| questions[i].as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority() {
        // "guide" wins over "best"
        assert_eq!(QuestionCategory::classify("Best guide to EQ?"), QuestionCategory::Beginner);
        // "compare" wins over "make"
        assert_eq!(
            QuestionCategory::classify("Compare ways to make beats"),
            QuestionCategory::Comparison
        );
        assert_eq!(
            QuestionCategory::classify("Can AI CREATE melodies?"),
            QuestionCategory::Creative
        );
        assert_eq!(QuestionCategory::classify("What is sidechain?"), QuestionCategory::Technical);
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<String> = Vec::new();
        assert!(organize_questions(&empty).is_empty());
    }

    #[test]
    fn test_one_of_each_category() {
        let questions = [
            "Which DAW is best for trap?",
            "What is a compressor ratio?",
            "How does AI mastering work?",
            "How to mix vocals?",
        ];
        let ordered = organize_questions(&questions);
        assert_eq!(
            ordered,
            vec![
                "How to mix vocals?",
                "How does AI mastering work?",
                "What is a compressor ratio?",
                "Which DAW is best for trap?",
            ]
        );
    }

    #[test]
    fn test_caps_and_truncation() {
        let questions = [
            "How to sample legally?",
            "Step by step beat tutorial",
            "A third guide to mixing",
            "Can I use loops?",
            "What is LUFS?",
        ];
        let ordered = organize_questions(&questions);
        assert_eq!(ordered.len(), 4);
        assert_eq!(ordered[0], "How to sample legally?");
        assert_eq!(ordered[1], "Step by step beat tutorial");
        assert_eq!(ordered[2], "Can I use loops?");
        assert_eq!(ordered[3], "What is LUFS?");
    }

    #[test]
    fn test_backfill_in_input_order() {
        let questions = ["How to start?", "A guide?", "Tutorial three?", "Guide four?"];
        let ordered = organize_questions(&questions);
        assert_eq!(ordered, vec!["How to start?", "A guide?", "Tutorial three?", "Guide four?"]);
    }

    #[test]
    fn test_fewer_than_four() {
        let questions = ["What is gain staging?", "Best monitors vs headphones?"];
        let ordered = organize_questions(&questions);
        assert_eq!(ordered, vec!["What is gain staging?", "Best monitors vs headphones?"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let questions = ["What is EQ?", "What is EQ?", "What is EQ?", "What is EQ?"];
        assert_eq!(organize_questions(&questions).len(), 4);
    }

    #[test]
    fn test_deterministic() {
        let questions = vec![
            "How to use Serum?".to_string(),
            "Is Ableton better vs FL?".to_string(),
            "What makes a hit?".to_string(),
            "Why do mixes sound muddy?".to_string(),
            "How do producers create textures?".to_string(),
        ];
        assert_eq!(organize_questions(&questions), organize_questions(&questions));
    }
}
