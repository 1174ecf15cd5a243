//! Error types for the `ragkit-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
///
/// Every variant is terminal for the query that produced it. Nothing in this
/// crate retries; callers decide whether to retry, degrade, or report.
#[derive(Debug, Error)]
pub enum RagError {
    /// Retrieval was requested against a corpus with no documents.
    #[error("corpus is empty")]
    EmptyCorpus,

    /// The query was empty or contained only whitespace.
    #[error("query is empty")]
    EmptyQuery,

    /// A vector did not have the dimensionality of the index it was used with.
    #[error("dimension mismatch: index has {expected} dimensions, vector has {actual}")]
    DimensionMismatch {
        /// Dimensionality fixed by the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// A search asked for zero results.
    #[error("top_k must be greater than zero")]
    InvalidTopK,

    /// The embedding provider failed or returned malformed output.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingProviderError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation provider failed (transport, authentication, quota, ...).
    #[error("Generation error ({provider}): {message}")]
    GenerationProviderError {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Shorthand for an [`RagError::EmbeddingProviderError`].
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingProviderError { provider: provider.into(), message: message.into() }
    }

    /// Shorthand for a [`RagError::GenerationProviderError`].
    pub fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationProviderError { provider: provider.into(), message: message.into() }
    }

    /// Returns `true` if the error originated in an external provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::EmbeddingProviderError { .. } | Self::GenerationProviderError { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
