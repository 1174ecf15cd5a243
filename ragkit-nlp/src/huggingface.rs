//! Task pipelines backed by the Hugging Face Inference API.
//!
//! This module is only available when the `huggingface` feature is enabled.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{NlpError, Result};
use crate::records::{Entity, ExtractedAnswer, GeneratedText, Sentiment, Summary, Translation};
use crate::tasks::{
    GenerationParams, QuestionAnswerer, Summarizer, SummaryLength, TextClassifier, TextGenerator,
    TokenClassifier, Translator, require_text, require_texts,
};

const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

const PROVIDER: &str = "HuggingFace";

/// The inference tasks this client can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Sentiment,
    Ner,
    QuestionAnswering,
    Summarization,
    Translation,
    TextGeneration,
}

impl Task {
    /// The default hosted model for this task.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Sentiment => "distilbert/distilbert-base-uncased-finetuned-sst-2-english",
            Self::Ner => "dbmdz/bert-large-cased-finetuned-conll03-english",
            Self::QuestionAnswering => "distilbert/distilbert-base-cased-distilled-squad",
            Self::Summarization => "sshleifer/distilbart-cnn-12-6",
            Self::Translation => "Helsinki-NLP/opus-mt-en-fr",
            Self::TextGeneration => "openai-community/gpt2",
        }
    }

    /// The pipeline tag used in the endpoint path.
    pub fn pipeline(self) -> &'static str {
        match self {
            Self::Sentiment => "text-classification",
            Self::Ner => "token-classification",
            Self::QuestionAnswering => "question-answering",
            Self::Summarization => "summarization",
            Self::Translation => "translation",
            Self::TextGeneration => "text-generation",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pipeline())
    }
}

/// Model ids per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskModels {
    pub sentiment: String,
    pub ner: String,
    pub question_answering: String,
    pub summarization: String,
    pub translation: String,
    pub text_generation: String,
}

impl Default for TaskModels {
    fn default() -> Self {
        Self {
            sentiment: Task::Sentiment.default_model().to_string(),
            ner: Task::Ner.default_model().to_string(),
            question_answering: Task::QuestionAnswering.default_model().to_string(),
            summarization: Task::Summarization.default_model().to_string(),
            translation: Task::Translation.default_model().to_string(),
            text_generation: Task::TextGeneration.default_model().to_string(),
        }
    }
}

impl TaskModels {
    pub fn get(&self, task: Task) -> &str {
        match task {
            Task::Sentiment => &self.sentiment,
            Task::Ner => &self.ner,
            Task::QuestionAnswering => &self.question_answering,
            Task::Summarization => &self.summarization,
            Task::Translation => &self.translation,
            Task::TextGeneration => &self.text_generation,
        }
    }

    fn slot(&mut self, task: Task) -> &mut String {
        match task {
            Task::Sentiment => &mut self.sentiment,
            Task::Ner => &mut self.ner,
            Task::QuestionAnswering => &mut self.question_answering,
            Task::Summarization => &mut self.summarization,
            Task::Translation => &mut self.translation,
            Task::TextGeneration => &mut self.text_generation,
        }
    }
}

/// A client implementing every task trait against hosted inference.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_nlp::{TextClassifier, huggingface::HuggingFaceTasks};
///
/// let hf = HuggingFaceTasks::from_env()?;
/// let labels = hf.classify(&["I hate this product", "This is amazing!"]).await?;
/// ```
#[derive(Clone)]
pub struct HuggingFaceTasks {
    client: reqwest::Client,
    token: String,
    base_url: String,
    models: TaskModels,
}

impl HuggingFaceTasks {
    /// Create a client with an access token and the default models.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(NlpError::provider(PROVIDER, "access token must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            models: TaskModels::default(),
        })
    }

    /// Create a client using the `HF_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("HF_TOKEN")
            .map_err(|_| NlpError::provider(PROVIDER, "HF_TOKEN environment variable not set"))?;
        Self::new(token)
    }

    /// Use `model` for `task` instead of the default.
    pub fn with_model(mut self, task: Task, model: impl Into<String>) -> Self {
        *self.models.slot(task) = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn models(&self) -> &TaskModels {
        &self.models
    }

    fn endpoint(&self, task: Task) -> String {
        format!("{}/{}", self.base_url, self.models.get(task))
    }

    async fn post<B, R>(&self, task: Task, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(provider = PROVIDER, %task, model = self.models.get(task), "inference request");

        let response = self
            .client
            .post(self.endpoint(task))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, %task, error = %e, "request failed");
                NlpError::provider(PROVIDER, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
            error!(provider = PROVIDER, %task, %status, "API error");
            return Err(NlpError::provider(PROVIDER, format!("API returned {status}: {detail}")));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, %task, error = %e, "failed to parse response");
            NlpError::provider(PROVIDER, format!("failed to parse {task} response: {e}"))
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct InferenceRequest<I: Serialize, P: Serialize> {
    inputs: I,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<P>,
}

#[derive(Serialize)]
struct QuestionInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Serialize)]
struct NerParameters {
    aggregation_strategy: &'static str,
}

#[derive(Serialize)]
struct TextGenerationParameters {
    max_new_tokens: usize,
    do_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    num_return_sequences: usize,
}

impl From<&GenerationParams> for TextGenerationParameters {
    fn from(params: &GenerationParams) -> Self {
        Self {
            max_new_tokens: params.max_length,
            do_sample: params.do_sample,
            temperature: params.do_sample.then_some(params.temperature),
            num_return_sequences: params.num_return_sequences,
        }
    }
}

/// `text-classification` output: a score list per input, or a single flat
/// score list when one input was sent.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<Sentiment>>),
    Flat(Vec<Sentiment>),
}

impl ClassificationResponse {
    fn into_top_labels(self, inputs: usize) -> Result<Vec<Sentiment>> {
        let labels: Vec<Sentiment> = match self {
            Self::Nested(per_input) => {
                per_input.into_iter().filter_map(Sentiment::top).collect()
            }
            Self::Flat(scores) if inputs == 1 => Sentiment::top(scores).into_iter().collect(),
            Self::Flat(labels) => labels,
        };
        if labels.len() != inputs {
            return Err(NlpError::provider(
                PROVIDER,
                format!("expected {inputs} classifications, got {}", labels.len()),
            ));
        }
        Ok(labels)
    }
}

fn first<T>(items: Vec<T>, task: Task) -> Result<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| NlpError::provider(PROVIDER, format!("{task} returned no output")))
}

#[async_trait]
impl TextClassifier for HuggingFaceTasks {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn classify(&self, texts: &[&str]) -> Result<Vec<Sentiment>> {
        let texts = require_texts(texts)?;
        let request = InferenceRequest::<_, ()> { inputs: texts, parameters: None };
        let response: ClassificationResponse = self.post(Task::Sentiment, &request).await?;
        response.into_top_labels(texts.len())
    }
}

#[async_trait]
impl TokenClassifier for HuggingFaceTasks {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>> {
        let text = require_text(text)?;
        let request = InferenceRequest {
            inputs: text,
            parameters: Some(NerParameters { aggregation_strategy: "simple" }),
        };
        self.post(Task::Ner, &request).await
    }
}

#[async_trait]
impl QuestionAnswerer for HuggingFaceTasks {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn answer(&self, question: &str, context: &str) -> Result<ExtractedAnswer> {
        let question = require_text(question)?;
        let context = require_text(context)?;
        let request =
            InferenceRequest::<_, ()> { inputs: QuestionInputs { question, context }, parameters: None };
        self.post(Task::QuestionAnswering, &request).await
    }
}

#[async_trait]
impl Summarizer for HuggingFaceTasks {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn summarize(&self, text: &str, length: SummaryLength) -> Result<Summary> {
        let text = require_text(text)?;
        length.validate()?;
        let request = InferenceRequest { inputs: text, parameters: Some(length) };
        let summaries: Vec<Summary> = self.post(Task::Summarization, &request).await?;
        first(summaries, Task::Summarization)
    }
}

#[async_trait]
impl Translator for HuggingFaceTasks {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn translate(&self, text: &str) -> Result<Translation> {
        let text = require_text(text)?;
        let request = InferenceRequest::<_, ()> { inputs: text, parameters: None };
        let translations: Vec<Translation> = self.post(Task::Translation, &request).await?;
        first(translations, Task::Translation)
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceTasks {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<Vec<GeneratedText>> {
        let prompt = require_text(prompt)?;
        params.validate()?;
        let request = InferenceRequest {
            inputs: prompt,
            parameters: Some(TextGenerationParameters::from(&params)),
        };
        let generated: Vec<GeneratedText> = self.post(Task::TextGeneration, &request).await?;
        if generated.is_empty() {
            return Err(NlpError::provider(PROVIDER, "text-generation returned no output"));
        }
        Ok(generated)
    }
}
