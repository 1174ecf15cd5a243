//! One trait per NLP task, plus the parameters they accept.
//!
//! Implementations validate their input with the helpers in this module
//! before contacting a provider, so [`NlpError::EmptyInput`] and
//! [`NlpError::InvalidParameters`] never cost a network round trip.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{NlpError, Result};
use crate::records::{Entity, ExtractedAnswer, GeneratedText, Sentiment, Summary, Translation};

/// Split pasted text into trimmed, non-blank lines.
///
/// ```
/// let lines = ragkit_nlp::split_nonblank_lines("I hate this\n\n  This is amazing! \n");
/// assert_eq!(lines, vec!["I hate this", "This is amazing!"]);
/// ```
pub fn split_nonblank_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty()).collect()
}

/// Fails with [`NlpError::EmptyInput`] if `text` is blank.
pub fn require_text(text: &str) -> Result<&str> {
    if text.trim().is_empty() { Err(NlpError::EmptyInput) } else { Ok(text) }
}

/// Fails with [`NlpError::EmptyInput`] if `texts` is empty or any entry is blank.
pub fn require_texts<'a>(texts: &'a [&'a str]) -> Result<&'a [&'a str]> {
    if texts.is_empty() || texts.iter().any(|t| t.trim().is_empty()) {
        return Err(NlpError::EmptyInput);
    }
    Ok(texts)
}

/// Token bounds for a generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLength {
    pub min_length: usize,
    pub max_length: usize,
}

impl SummaryLength {
    pub fn new(min_length: usize, max_length: usize) -> Result<Self> {
        let length = Self { min_length, max_length };
        length.validate()?;
        Ok(length)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(NlpError::InvalidParameters("max_length must be greater than zero".into()));
        }
        if self.min_length > self.max_length {
            return Err(NlpError::InvalidParameters(format!(
                "min_length ({}) exceeds max_length ({})",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self { min_length: 20, max_length: 50 }
    }
}

/// Decoding parameters for open-ended text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    pub max_length: usize,
    pub do_sample: bool,
    /// Only meaningful when `do_sample` is set.
    pub temperature: f32,
    pub num_return_sequences: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { max_length: 50, do_sample: true, temperature: 0.7, num_return_sequences: 1 }
    }
}

impl GenerationParams {
    /// Greedy decoding: no sampling, one sequence.
    pub fn greedy() -> Self {
        Self { do_sample: false, ..Self::default() }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_num_return_sequences(mut self, n: usize) -> Self {
        self.num_return_sequences = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(NlpError::InvalidParameters("max_length must be greater than zero".into()));
        }
        if self.num_return_sequences == 0 {
            return Err(NlpError::InvalidParameters(
                "num_return_sequences must be greater than zero".into(),
            ));
        }
        if self.do_sample && (self.temperature.is_nan() || self.temperature <= 0.0) {
            return Err(NlpError::InvalidParameters(format!(
                "temperature must be positive when sampling, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Sentiment (or any single-label) classification.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Classify each text, returning the top label per input in input order.
    async fn classify(&self, texts: &[&str]) -> Result<Vec<Sentiment>>;
}

/// Named entity recognition with aggregated entity groups.
#[async_trait]
pub trait TokenClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Extractive question answering over a supplied context.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    fn name(&self) -> &str;

    async fn answer(&self, question: &str, context: &str) -> Result<ExtractedAnswer>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<Summary>;
}

/// Translation between a fixed language pair chosen by the model.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &str;

    async fn translate(&self, text: &str) -> Result<Translation>;
}

/// Open-ended continuation of a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<Vec<GeneratedText>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_dropped() {
        assert!(split_nonblank_lines(" \n\t\n").is_empty());
        assert_eq!(split_nonblank_lines("a\r\nb"), vec!["a", "b"]);
    }

    #[test]
    fn texts_must_be_present_and_non_blank() {
        assert!(matches!(require_texts(&[]), Err(NlpError::EmptyInput)));
        assert!(matches!(require_texts(&["ok", "  "]), Err(NlpError::EmptyInput)));
        assert!(require_texts(&["ok"]).is_ok());
        assert!(matches!(require_text("\n"), Err(NlpError::EmptyInput)));
    }

    #[test]
    fn summary_length_bounds() {
        assert!(SummaryLength::default().validate().is_ok());
        assert!(SummaryLength::new(10, 10).is_ok());
        assert!(matches!(SummaryLength::new(60, 50), Err(NlpError::InvalidParameters(_))));
        assert!(matches!(SummaryLength::new(0, 0), Err(NlpError::InvalidParameters(_))));
    }

    #[test]
    fn sampling_needs_positive_temperature() {
        assert!(GenerationParams::default().validate().is_ok());
        assert!(GenerationParams::default().with_temperature(0.0).validate().is_err());
        assert!(GenerationParams::default().with_temperature(f32::NAN).validate().is_err());
        assert!(GenerationParams::greedy().with_temperature(0.0).validate().is_ok());
        assert!(GenerationParams::default().with_num_return_sequences(0).validate().is_err());
        assert!(GenerationParams::default().with_max_length(0).validate().is_err());
    }
}
