//! Prompt assembly for context-grounded answers.
//!
//! [`PromptAssembler`] places retrieved documents verbatim under a
//! `Context:` heading and the user's question under `Question:`, wrapped in
//! an instruction to answer only from the context and to reply with
//! [`REFUSAL`] when the context has no answer.
//!
//! Retrieved context is bounded by a character budget. Documents are taken in
//! rank order; one that does not fit the remaining budget is skipped, except
//! the top-ranked document, which is cut at a character boundary so the
//! context is never empty. The instruction and the question are never cut.

use crate::config::RagConfig;
use crate::document::{Document, RetrievalResult};

/// The sentence the model is told to reply with when the context has no answer.
pub const REFUSAL: &str = "I cannot find the answer based on the provided information.";

/// The default context-only instruction. Contains [`REFUSAL`] verbatim.
pub const DEFAULT_INSTRUCTION: &str = "You are a helpful assistant. Answer the Question \
concisely and accurately using ONLY the provided Context. If the Context does not contain the \
answer, reply exactly: \"I cannot find the answer based on the provided information.\" \
Do not use outside knowledge and do not make up an answer.";

/// Builds generation prompts from retrieved documents and a question.
///
/// # Example
///
/// ```rust
/// use ragkit_rag::{Document, PromptAssembler};
///
/// let docs = vec![Document { id: 0, text: "Battery life is 10 hours.".into() }];
/// let prompt = PromptAssembler::new().assemble(&docs, "How long does the battery last?");
/// assert!(prompt.contains("Battery life is 10 hours."));
/// assert!(prompt.contains("How long does the battery last?"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PromptAssembler {
    instruction: String,
    max_context_chars: Option<usize>,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl PromptAssembler {
    /// Create an assembler with the default instruction and context budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler using the context budget from `config`.
    pub fn from_config(config: &RagConfig) -> Self {
        Self { instruction: DEFAULT_INSTRUCTION.to_string(), max_context_chars: None }
            .with_max_context_chars(config.max_context_chars)
    }

    /// Replace the instruction text.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Set the context budget in characters; `None` disables it.
    ///
    /// A budget of zero is raised to one character so the top-ranked
    /// document always contributes to the context.
    pub fn with_max_context_chars(mut self, chars: Option<usize>) -> Self {
        self.max_context_chars = chars.map(|c| c.max(1));
        self
    }

    /// The instruction placed at the top of every prompt.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Assemble a prompt from documents in rank order.
    pub fn assemble(&self, documents: &[Document], query: &str) -> String {
        self.render(documents.iter().map(|d| d.text.as_str()), query)
    }

    /// Assemble a prompt directly from retrieval results in rank order.
    pub fn assemble_results(&self, results: &[RetrievalResult], query: &str) -> String {
        self.render(results.iter().map(|r| r.text.as_str()), query)
    }

    fn render<'a>(&self, texts: impl Iterator<Item = &'a str>, query: &str) -> String {
        let context = self.select_context(texts).join("\n\n");
        format!(
            "{instruction}\n\n---\nContext:\n{context}\n---\nQuestion:\n{query}\n",
            instruction = self.instruction,
        )
    }

    fn select_context<'a>(&self, texts: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
        let Some(budget) = self.max_context_chars else {
            return texts.collect();
        };

        let mut remaining = budget;
        let mut selected = Vec::new();
        for (rank, text) in texts.enumerate() {
            let chars = text.chars().count();
            if chars <= remaining {
                remaining -= chars;
                selected.push(text);
            } else if rank == 0 {
                selected.push(truncate_chars(text, budget));
                remaining = 0;
            }
        }
        selected
    }
}

/// The longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Ask a question about a sample of tabular data the user supplied.
pub fn assemble_data_question(preview: &str, question: &str) -> String {
    format!(
        "The user uploaded a file. Here's a small sample of its contents:\n\n{preview}\n\n\
         Now, based on this data, answer the following question:\n{question}"
    )
}

/// The header line plus the first `rows` data lines of a delimited text table.
pub fn csv_preview(text: &str, rows: usize) -> String {
    text.lines().take(rows + 1).collect::<Vec<_>>().join("\n")
}
