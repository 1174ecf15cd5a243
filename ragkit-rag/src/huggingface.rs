//! Sentence embeddings from the Hugging Face Inference API.
//!
//! This module is only available when the `huggingface` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// The default sentence-embedding model.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

const PROVIDER: &str = "HuggingFace";

/// An [`EmbeddingProvider`] calling the `feature-extraction` pipeline.
///
/// Sentence-transformer models return one pooled vector per input. Models
/// that return per-token vectors are mean-pooled here.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit_rag::huggingface::HuggingFaceEmbeddingProvider;
///
/// let provider = HuggingFaceEmbeddingProvider::from_env()?;
/// let vectors = provider.embed_batch(&["first", "second"]).await?;
/// ```
pub struct HuggingFaceEmbeddingProvider {
    client: reqwest::Client,
    token: String,
    base_url: String,
    model: String,
}

impl HuggingFaceEmbeddingProvider {
    /// Create a provider with an access token and the default model.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(RagError::embedding(PROVIDER, "access token must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create a provider using the `HF_TOKEN` environment variable.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("HF_TOKEN").map_err(|_| {
            RagError::embedding(PROVIDER, "HF_TOKEN environment variable not set")
        })?;
        Self::new(token)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}/pipeline/feature-extraction", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [&'a str],
}

/// `feature-extraction` output: pooled `[input][dim]` or per-token `[input][token][dim]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    PerToken(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtractionResponse {
    fn into_sentence_vectors(self) -> Vec<Vec<f32>> {
        match self {
            Self::Pooled(vectors) => vectors,
            Self::PerToken(inputs) => inputs.into_iter().map(|tokens| mean_pool(&tokens)).collect(),
        }
    }
}

/// Element-wise mean of token vectors.
fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; first.len()];
    for token in tokens {
        for (acc, v) in sum.iter_mut().zip(token) {
            *acc += v;
        }
    }
    let count = tokens.len() as f32;
    sum.iter_mut().for_each(|x| *x /= count);
    sum
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&FeatureExtractionRequest { inputs: texts })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::embedding(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let parsed: FeatureExtractionResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        Ok(parsed.into_sentence_vectors())
    }
}
