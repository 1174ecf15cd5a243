//! Generation provider trait and explicit conversation history.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Who authored a [`Message`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Model => f.write_str("model"),
        }
    }
}

/// A single chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// A hosted or local text-generation backend.
///
/// Implementations surface transport failures (timeouts, authentication,
/// quota) as [`RagError::GenerationProviderError`](crate::RagError::GenerationProviderError)
/// and never retry.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short provider name used in error reports and logs.
    fn name(&self) -> &str;

    /// Generate a reply to a conversation whose last message is the user's turn.
    async fn generate_chat(&self, messages: &[Message]) -> Result<String>;

    /// Generate free-form text for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_chat(&[Message::user(prompt)]).await
    }
}

/// Chat history owned by the caller and passed to each generation call.
///
/// # Example
///
/// ```rust,ignore
/// let mut conversation = Conversation::new();
/// let reply = conversation.send(&gemini, "Hi there").await?;
/// let follow_up = conversation.send(&gemini, "What did I just say?").await?;
/// assert_eq!(conversation.len(), 4);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a conversation from previously stored messages.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Send `text` as the next user turn and record the model's reply.
    ///
    /// The full history is passed to the provider. If generation fails the
    /// user turn is removed again, leaving the history as it was.
    pub async fn send(&mut self, provider: &dyn GenerationProvider, text: &str) -> Result<String> {
        self.send_with_prompt(provider, text, text).await
    }

    /// Like [`send`](Conversation::send), but the provider sees `prompt` for
    /// this turn while the history records `display_text`.
    ///
    /// Useful when the turn is augmented before sending (for example with a
    /// data preview) and the stored history should keep what the user typed.
    pub async fn send_with_prompt(
        &mut self,
        provider: &dyn GenerationProvider,
        display_text: &str,
        prompt: &str,
    ) -> Result<String> {
        let mut outgoing = self.messages.clone();
        outgoing.push(Message::user(prompt));
        self.messages.push(Message::user(display_text));

        match provider.generate_chat(&outgoing).await {
            Ok(reply) => {
                debug!(
                    provider = provider.name(),
                    turns = self.messages.len(),
                    "chat turn completed"
                );
                self.messages.push(Message::model(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.messages.pop();
                Err(e)
            }
        }
    }
}
