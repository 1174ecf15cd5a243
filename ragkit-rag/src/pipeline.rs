//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] runs the full question-answering workflow by composing
//! a [`Retriever`], a [`PromptAssembler`] and a [`GenerationProvider`]. Every
//! step awaits the previous one; nothing runs concurrently within a query.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit_rag::{Corpus, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generation_provider(Arc::new(my_llm))
//!     .build()?;
//!
//! let corpus = Corpus::from_lines(pasted_text);
//! let answer = pipeline.answer(&corpus, "How do I reset my device?").await?;
//! println!("{}", answer.answer);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RagConfig;
use crate::document::{Corpus, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;
use crate::prompt::{PromptAssembler, REFUSAL};
use crate::retriever::{IndexedCorpus, Retriever, validate_query};

/// The outcome of one RAG query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagAnswer {
    /// Text returned by the generation provider.
    pub answer: String,
    /// The prompt that was sent.
    pub prompt: String,
    /// Every retrieved document, in rank order. Under a context budget some of
    /// them may have been left out of `prompt`.
    pub retrieved: Vec<RetrievalResult>,
}

impl RagAnswer {
    /// Returns `true` if the model replied with the refusal sentence it was
    /// instructed to use when the context lacks an answer.
    ///
    /// This only recognises the declared refusal; it does not check whether a
    /// non-refusal answer is actually supported by the context.
    pub fn is_refusal(&self) -> bool {
        let normalized = self.answer.trim().trim_matches('"').to_lowercase();
        let refusal = REFUSAL.trim_end_matches('.').to_lowercase();
        normalized.starts_with(&refusal)
    }
}

/// The RAG pipeline orchestrator.
///
/// Query execution: embed corpus → build index → embed query → search →
/// assemble prompt → generate. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    retriever: Retriever,
    assembler: PromptAssembler,
    generation_provider: Arc<dyn GenerationProvider>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Return a reference to the prompt assembler.
    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    /// Return a reference to the generation provider.
    pub fn generation_provider(&self) -> &Arc<dyn GenerationProvider> {
        &self.generation_provider
    }

    /// Embed and index `corpus` once so it can serve several queries.
    pub async fn index(&self, corpus: &Corpus) -> Result<IndexedCorpus> {
        self.retriever.index(corpus).await
    }

    /// Retrieve the configured `top_k` documents for `query`.
    pub async fn retrieve(&self, corpus: &Corpus, query: &str) -> Result<Vec<RetrievalResult>> {
        self.retriever.retrieve(corpus, query, self.config.top_k).await
    }

    /// Answer `query` from `corpus`.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyCorpus`] and [`RagError::EmptyQuery`] before any
    /// provider call; provider errors unchanged.
    pub async fn answer(&self, corpus: &Corpus, query: &str) -> Result<RagAnswer> {
        let retrieved = self.retrieve(corpus, query).await?;
        self.generate(retrieved, query).await
    }

    /// Answer `query` from a corpus indexed earlier with [`index`](RagPipeline::index).
    pub async fn answer_indexed(&self, indexed: &IndexedCorpus, query: &str) -> Result<RagAnswer> {
        let retrieved = indexed.search(query, self.config.top_k).await?;
        self.generate(retrieved, query).await
    }

    /// Ask the generation provider `query` about `retrieved`, skipping retrieval.
    pub async fn generate(
        &self,
        retrieved: Vec<RetrievalResult>,
        query: &str,
    ) -> Result<RagAnswer> {
        validate_query(query)?;
        if retrieved.is_empty() {
            return Err(RagError::EmptyCorpus);
        }

        let prompt = self.assembler.assemble_results(&retrieved, query);
        let answer = self.generation_provider.generate(&prompt).await?;

        info!(
            provider = self.generation_provider.name(),
            retrieved = retrieved.len(),
            prompt_chars = prompt.len(),
            "query answered"
        );

        Ok(RagAnswer { answer, prompt, retrieved })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `generation_provider` are required. The config
/// defaults to [`RagConfig::default()`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    instruction: Option<String>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for both documents and queries.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Override the prompt instruction.
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let generation_provider = self
            .generation_provider
            .ok_or_else(|| RagError::ConfigError("generation_provider is required".to_string()))?;

        let mut assembler = PromptAssembler::from_config(&config);
        if let Some(instruction) = self.instruction {
            assembler = assembler.with_instruction(instruction);
        }

        Ok(RagPipeline {
            config,
            retriever: Retriever::new(embedding_provider),
            assembler,
            generation_provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> RagAnswer {
        RagAnswer { answer: text.to_string(), prompt: String::new(), retrieved: Vec::new() }
    }

    #[test]
    fn refusal_is_recognised_loosely() {
        assert!(answer(REFUSAL).is_refusal());
        assert!(answer("  \"I cannot find the answer based on the provided information\"\n").is_refusal());
        assert!(answer("i cannot find the answer based on the provided information. Sorry!").is_refusal());
        assert!(!answer("Battery life is about 10 hours.").is_refusal());
    }

    #[test]
    fn builder_requires_providers() {
        let err = RagPipeline::builder().build().err().unwrap();
        assert!(matches!(err, RagError::ConfigError(msg) if msg.contains("embedding_provider")));
    }
}
