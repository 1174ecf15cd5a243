//! Error types for the `ragkit-nlp` crate.

use thiserror::Error;

/// Errors that can occur while running an NLP task.
#[derive(Debug, Error)]
pub enum NlpError {
    /// No text was supplied, or every supplied text was blank.
    #[error("input is empty")]
    EmptyInput,

    /// Task parameters were rejected before any provider call.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The task provider failed or returned output that could not be decoded.
    #[error("Provider error ({provider}): {message}")]
    ProviderError { provider: String, message: String },
}

impl NlpError {
    /// Shorthand for an [`NlpError::ProviderError`].
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderError { provider: provider.into(), message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, NlpError>;
