//! Deterministic providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ragkit_rag::{EmbeddingProvider, GenerationProvider, Message, RagError, Result};
use tokio::sync::Notify;

/// Words whose occurrence counts make up a [`KeywordEmbedder`] vector.
pub const VOCABULARY: [&str; 4] = ["battery", "reset", "power", "warranty"];

pub fn product_faq() -> Vec<&'static str> {
    vec!["Battery life is 10 hours.", "Reset by holding power button 5 seconds.", "Warranty is 1 year."]
}

/// Bag-of-keywords embeddings: one dimension per [`VOCABULARY`] word.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub batch_calls: AtomicUsize,
    pub single_calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY.iter().map(|word| lower.matches(word).count() as f32).collect()
    }

    pub fn calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst) + self.single_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keywords"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// A [`KeywordEmbedder`] that parks any call whose input contains `marker`.
///
/// A parked call signals `entered` and waits until `release` is notified.
pub struct GatedEmbedder {
    pub marker: &'static str,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedEmbedder {
    pub fn new(marker: &'static str) -> Self {
        Self { marker, entered: Notify::new(), release: Notify::new() }
    }

    async fn pass(&self, texts: &[&str]) {
        if texts.iter().any(|t| t.contains(self.marker)) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GatedEmbedder {
    fn name(&self) -> &str {
        "gated"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.pass(&[text]).await;
        Ok(KeywordEmbedder::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.pass(texts).await;
        Ok(texts.iter().map(|t| KeywordEmbedder::vector(t)).collect())
    }
}

/// An embedder that is always unreachable.
pub struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::embedding("unreachable", "connection refused"))
    }
}

/// Embeds documents with `document_dims` and queries with `query_dims`.
pub struct SkewedEmbedder {
    pub document_dims: usize,
    pub query_dims: usize,
}

#[async_trait]
impl EmbeddingProvider for SkewedEmbedder {
    fn name(&self) -> &str {
        "skewed"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.5; self.query_dims])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.5; self.document_dims]).collect())
    }
}

/// Returns one embedding fewer than requested.
pub struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedder {
    fn name(&self) -> &str {
        "short"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
    }
}

/// Records every prompt and replies with a fixed answer (or fails).
#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub reply: String,
    pub fail: bool,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self { reply: reply.to_string(), ..Default::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationProvider for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate_chat(&self, messages: &[Message]) -> Result<String> {
        let prompt = messages.last().map(|m| m.text.clone()).unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        if self.fail {
            return Err(RagError::generation("recording", "401 Unauthorized"));
        }
        Ok(self.reply.clone())
    }
}
