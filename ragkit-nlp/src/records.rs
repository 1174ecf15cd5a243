//! Typed task outputs.
//!
//! Field names follow the JSON produced by Hugging Face task pipelines, so
//! the records deserialize directly from inference responses.

use serde::{Deserialize, Serialize};

/// A classification label with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: String,
    pub score: f32,
}

impl Sentiment {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self { label: label.into(), score }
    }

    /// The highest-scoring entry of a full score list.
    ///
    /// The first entry wins a tie. NaN scores never win.
    pub fn top(scores: impl IntoIterator<Item = Sentiment>) -> Option<Sentiment> {
        scores.into_iter().filter(|s| !s.score.is_nan()).fold(None, |best, s| match best {
            Some(b) if b.score >= s.score => Some(b),
            _ => Some(s),
        })
    }
}

/// A named entity found in the input, with character offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Aggregated entity type, e.g. `PER`, `LOC` or `ORG`.
    pub entity_group: String,
    pub word: String,
    pub score: f32,
    pub start: usize,
    pub end: usize,
}

/// A span of the context that answers a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAnswer {
    pub answer: String,
    pub score: f32,
    /// Character offset of the answer in the context.
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub translation_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_picks_highest_score() {
        let top = Sentiment::top(vec![
            Sentiment::new("NEGATIVE", 0.02),
            Sentiment::new("POSITIVE", 0.98),
        ]);
        assert_eq!(top, Some(Sentiment::new("POSITIVE", 0.98)));
    }

    #[test]
    fn top_keeps_first_on_tie_and_skips_nan() {
        let top = Sentiment::top(vec![
            Sentiment::new("NaN", f32::NAN),
            Sentiment::new("A", 0.5),
            Sentiment::new("B", 0.5),
        ]);
        assert_eq!(top.unwrap().label, "A");
        assert!(Sentiment::top(Vec::new()).is_none());
    }

    #[test]
    fn entity_decodes_pipeline_json() {
        let entity: Entity = serde_json::from_str(
            r#"{"entity_group":"LOC","score":0.9993,"word":"New York","start":14,"end":22}"#,
        )
        .unwrap();
        assert_eq!(entity.entity_group, "LOC");
        assert_eq!(entity.word, "New York");
        assert_eq!((entity.start, entity.end), (14, 22));
    }
}
