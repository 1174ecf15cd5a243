//! # ragkit-rag
//!
//! Minimal retrieval-augmented generation.
//!
//! A [`Corpus`] is embedded by an [`EmbeddingProvider`] into a [`FlatL2Index`]
//! (exact squared-L2 search). A query is embedded by the same provider and the
//! closest documents are placed in a prompt by the [`PromptAssembler`], which
//! tells the model to answer only from that context. A [`GenerationProvider`]
//! produces the answer. [`RagPipeline`] runs the whole sequence.
//!
//! [`DataAnalyst`] drives a short tool-choosing loop over a [`DataTable`].
//!
//! ## Features
//!
//! - `gemini` - [`gemini::GeminiClient`] (generation, embeddings, model listing)
//! - `openai` - [`openai::OpenAIEmbeddingProvider`], [`openai::OpenAIChatProvider`]
//! - `huggingface` - [`huggingface::HuggingFaceEmbeddingProvider`]
//! - `full` - all of the above
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragkit_rag::{Corpus, RagPipeline};
//! use ragkit_rag::gemini::GeminiClient;
//!
//! let gemini = Arc::new(GeminiClient::from_env()?);
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(gemini.clone())
//!     .generation_provider(gemini)
//!     .build()?;
//!
//! let corpus = Corpus::from_texts([
//!     "Battery life is 10 hours.",
//!     "Reset by holding power button 5 seconds.",
//!     "Warranty is 1 year.",
//! ]);
//! let answer = pipeline.answer(&corpus, "How long does the battery last?").await?;
//! ```

pub mod analyst;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "huggingface")]
pub mod huggingface;
#[cfg(feature = "openai")]
pub mod openai;

pub use analyst::{AnalystReport, AnalystTool, ColumnSummary, DataAnalyst, DataTable, parse_action};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Corpus, Document, RetrievalResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::{Conversation, GenerationProvider, Message, Role};
pub use index::{FlatL2Index, Neighbor, cosine_similarity, squared_l2};
pub use pipeline::{RagAnswer, RagPipeline, RagPipelineBuilder};
pub use prompt::{
    DEFAULT_INSTRUCTION, PromptAssembler, REFUSAL, assemble_data_question, csv_preview,
};
pub use retriever::{IndexedCorpus, KnowledgeBase, Retriever};

#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
#[cfg(feature = "huggingface")]
pub use huggingface::HuggingFaceEmbeddingProvider;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatProvider, OpenAIEmbeddingProvider};
