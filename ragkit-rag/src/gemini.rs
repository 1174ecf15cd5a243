//! Gemini generation and embedding provider over the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{GenerationProvider, Message, Role};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// The default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

const PROVIDER: &str = "Gemini";

/// Most requests `batchEmbedContents` accepts in one call.
const MAX_BATCH_EMBED_REQUESTS: usize = 100;

/// Environment variables checked for an API key, in order.
const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Prefix a bare model id with `models/`.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") { model.to_string() } else { format!("models/{model}") }
}

/// A Gemini client implementing both [`GenerationProvider`] and
/// [`EmbeddingProvider`].
///
/// Document batches are embedded with task type `RETRIEVAL_DOCUMENT`, single
/// texts (queries) with `RETRIEVAL_QUERY`.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_rag::gemini::GeminiClient;
///
/// let gemini = GeminiClient::from_env()?.with_model("gemini-2.5-flash-lite");
/// let reply = gemini.generate("Say hello").await?;
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
    model: String,
    embedding_model: String,
    temperature: Option<f32>,
}

/// A model entry returned by [`GeminiClient::list_models`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-2.5-flash`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// API methods the model supports, e.g. `generateContent`, `embedContent`.
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods.iter().any(|m| m == method)
    }
}

impl GeminiClient {
    /// Create a client with the given API key and default models.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::ConfigError("Gemini API key must not be empty".to_string()));
        }
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| RagError::ConfigError(format!("invalid Gemini base URL: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model: model_path(DEFAULT_MODEL),
            embedding_model: model_path(DEFAULT_EMBEDDING_MODEL),
            temperature: None,
        })
    }

    /// Create a client from `GOOGLE_API_KEY`, falling back to `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                RagError::ConfigError(format!("none of {} is set", API_KEY_VARS.join(", ")))
            })?;
        Self::new(api_key)
    }

    /// Set the generation model (`gemini-2.5-flash` or `models/gemini-2.5-flash`).
    pub fn with_model(mut self, model: impl AsRef<str>) -> Self {
        self.model = model_path(model.as_ref());
        self
    }

    /// Set the embedding model.
    pub fn with_embedding_model(mut self, model: impl AsRef<str>) -> Self {
        self.embedding_model = model_path(model.as_ref());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Use a different API root (for proxies or regional endpoints).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let normalized =
            if base_url.ends_with('/') { base_url.to_string() } else { format!("{base_url}/") };
        self.base_url = Url::parse(&normalized)
            .map_err(|e| RagError::ConfigError(format!("invalid Gemini base URL: {e}")))?;
        Ok(self)
    }

    /// The generation model resource name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// List the models available to this API key, following pagination.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.url("models")?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }
            let page: ListModelsResponse = self
                .send_json(self.client.get(url))
                .await
                .map_err(|m| RagError::generation(PROVIDER, m))?;
            models.extend(page.models);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(provider = PROVIDER, count = models.len(), "listed models");
        Ok(models)
    }

    fn url(&self, suffix: &str) -> Result<Url> {
        self.base_url
            .join(suffix)
            .map_err(|e| RagError::ConfigError(format!("failed to construct URL '{suffix}': {e}")))
    }

    /// One `batchEmbedContents` body per chunk of at most
    /// [`MAX_BATCH_EMBED_REQUESTS`] texts, in input order.
    fn batch_requests<'a>(
        &'a self,
        texts: &[&str],
        task_type: TaskType,
    ) -> Vec<BatchEmbedRequest<'a>> {
        texts
            .chunks(MAX_BATCH_EMBED_REQUESTS)
            .map(|chunk| BatchEmbedRequest {
                requests: chunk
                    .iter()
                    .map(|text| EmbedRequest {
                        model: &self.embedding_model,
                        content: Content {
                            role: None,
                            parts: vec![Part { text: text.to_string() }],
                        },
                        task_type,
                    })
                    .collect(),
            })
            .collect()
    }

    async fn embed_with_task(&self, texts: &[&str], task_type: TaskType) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batches = self.batch_requests(texts, task_type);
        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            requests = batches.len(),
            model = %self.embedding_model,
            ?task_type,
            "embedding batch"
        );

        let url = self.url(&format!("{}:batchEmbedContents", self.embedding_model))?;
        let mut embeddings = Vec::with_capacity(texts.len());
        for body in &batches {
            let response: BatchEmbedResponse = self
                .send_json(self.client.post(url.clone()).json(body))
                .await
                .map_err(|m| RagError::embedding(PROVIDER, m))?;
            if response.embeddings.len() != body.requests.len() {
                return Err(RagError::embedding(
                    PROVIDER,
                    format!(
                        "expected {} embeddings, got {}",
                        body.requests.len(),
                        response.embeddings.len()
                    ),
                ));
            }
            embeddings.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(embeddings)
    }

    /// Send a request and decode the JSON body, describing failures as text.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<T, String> {
        let response =
            request.header("x-goog-api-key", &self.api_key).send().await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                format!("request failed: {e}")
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "API error");
            return Err(format!("API returned {status}: {}", error_detail(body)));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            format!("failed to parse response: {e}")
        })
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl From<&Message> for Content {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Model => "model",
        };
        Self { role: Some(role.to_string()), parts: vec![Part { text: message.text.clone() }] }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content,
    task_type: TaskType,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateResponse) -> std::result::Result<String, String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(format!("prompt blocked: {reason}"));
    }
    let candidate =
        response.candidates.into_iter().next().ok_or_else(|| "no candidates returned".to_string())?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(format!("empty candidate (finish reason {reason})"));
    }
    Ok(text)
}

// ── Provider implementations ───────────────────────────────────────

#[async_trait]
impl GenerationProvider for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate_chat(&self, messages: &[Message]) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, turns = messages.len(), "generating content");

        let body = GenerateRequest {
            contents: messages.iter().map(Content::from).collect(),
            generation_config: self.temperature.map(|temperature| GenerationConfig { temperature }),
        };
        let url = self.url(&format!("{}:generateContent", self.model))?;
        let response: GenerateResponse = self
            .send_json(self.client.post(url).json(&body))
            .await
            .map_err(|m| RagError::generation(PROVIDER, m))?;

        response_text(response).map_err(|m| RagError::generation(PROVIDER, m))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_task(&[text], TaskType::RetrievalQuery)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.embed_with_task(texts, TaskType::RetrievalDocument).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_are_normalised() {
        assert_eq!(model_path("gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(model_path("models/text-embedding-004"), "models/text-embedding-004");
    }

    #[test]
    fn urls_join_model_and_method() {
        let client = GeminiClient::new("key").unwrap().with_model("gemini-2.5-flash-lite");
        let url = client.url(&format!("{}:generateContent", client.model())).unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:generateContent"
        );
    }

    #[test]
    fn custom_base_url_gets_trailing_slash() {
        let client = GeminiClient::new("key").unwrap().with_base_url("http://localhost:8080/v1").unwrap();
        assert_eq!(client.url("models").unwrap().as_str(), "http://localhost:8080/v1/models");
    }

    #[test]
    fn history_maps_to_gemini_roles() {
        let body = GenerateRequest {
            contents: [Message::user("hi"), Message::model("hello")].iter().map(Content::from).collect(),
            generation_config: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "hello");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn embed_request_uses_camel_case_task_type() {
        let request = EmbedRequest {
            model: "models/text-embedding-004",
            content: Content { role: None, parts: vec![Part { text: "doc".into() }] },
            task_type: TaskType::RetrievalDocument,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_DOCUMENT");
        assert!(json["content"].get("role").is_none());
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Ten "},{"text":"hours."}]},
                "finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "Ten hours.");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(response_text(response).unwrap_err(), "prompt blocked: SAFETY");
    }

    #[test]
    fn empty_candidate_reports_finish_reason() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap();
        assert!(response_text(response).unwrap_err().contains("MAX_TOKENS"));
    }

    #[test]
    fn model_listing_decodes() {
        let page: ListModelsResponse = serde_json::from_str(
            r#"{"models":[{"name":"models/gemini-2.5-flash","displayName":"Gemini 2.5 Flash",
                "supportedGenerationMethods":["generateContent","countTokens"]},
               {"name":"models/text-embedding-004","supportedGenerationMethods":["embedContent"]}],
               "nextPageToken":"abc"}"#,
        )
        .unwrap();
        assert_eq!(page.models.len(), 2);
        assert!(page.models[0].supports("generateContent"));
        assert!(!page.models[1].supports("generateContent"));
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn batch_embeddings_decode() {
        let response: BatchEmbedResponse =
            serde_json::from_str(r#"{"embeddings":[{"values":[0.1,0.2]},{"values":[0.3,0.4]}]}"#)
                .unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn large_batches_are_split_in_order() {
        let client = GeminiClient::new("key").unwrap();
        let owned: Vec<String> = (0..250).map(|i| format!("doc {i}")).collect();
        let texts: Vec<&str> = owned.iter().map(String::as_str).collect();

        let batches = client.batch_requests(&texts, TaskType::RetrievalDocument);

        let sizes: Vec<usize> = batches.iter().map(|b| b.requests.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        let json = serde_json::to_value(&batches[1]).unwrap();
        assert_eq!(json["requests"][0]["content"]["parts"][0]["text"], "doc 100");
        assert_eq!(json["requests"][99]["content"]["parts"][0]["text"], "doc 199");
        assert_eq!(batches[2].requests[49].content.parts[0].text, "doc 249");
    }

    #[test]
    fn small_batches_stay_in_one_request() {
        let client = GeminiClient::new("key").unwrap();
        let batches = client.batch_requests(&["a", "b"], TaskType::RetrievalQuery);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].requests.len(), 2);
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(GeminiClient::new(""), Err(RagError::ConfigError(_))));
    }
}
