//! # ragkit-nlp
//!
//! Typed NLP task pipelines: sentiment classification, named entity
//! recognition, extractive question answering, summarization, translation and
//! open-ended text generation.
//!
//! Each task is an async trait so hosted and local backends can be swapped
//! behind `Arc<dyn ...>`. Outputs are named records rather than loose JSON.
//!
//! ## Features
//!
//! - `huggingface` - [`HuggingFaceTasks`](huggingface::HuggingFaceTasks),
//!   implementing every task against the Hugging Face Inference API
//! - `full` - all of the above
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragkit_nlp::{TextClassifier, split_nonblank_lines};
//! use ragkit_nlp::huggingface::HuggingFaceTasks;
//!
//! let hf = HuggingFaceTasks::from_env()?;
//! let texts = split_nonblank_lines(pasted);
//! for (text, sentiment) in texts.iter().zip(hf.classify(&texts).await?) {
//!     println!("{text}: {} ({:.4})", sentiment.label, sentiment.score);
//! }
//! ```

pub mod error;
pub mod records;
pub mod tasks;

#[cfg(feature = "huggingface")]
pub mod huggingface;

pub use error::{NlpError, Result};
pub use records::{Entity, ExtractedAnswer, GeneratedText, Sentiment, Summary, Translation};
pub use tasks::{
    GenerationParams, QuestionAnswerer, Summarizer, SummaryLength, TextClassifier, TextGenerator,
    TokenClassifier, Translator, require_text, require_texts, split_nonblank_lines,
};

#[cfg(feature = "huggingface")]
pub use huggingface::{HuggingFaceTasks, Task, TaskModels};
