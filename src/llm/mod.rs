//! Chat-completion client abstractions.
//!
//! The [`ChatModel`] trait defines the single non-streaming call the
//! orchestrator makes per turn. [`ChatCompletionsClient`] implements it
//! against an OpenAI-compatible `/v1/chat/completions` endpoint.

pub mod chat_completions;

pub use chat_completions::ChatCompletionsClient;

/// Connection and model settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Base URL for the API (e.g. `https://api.groq.com/openai`).
    pub base_url: String,
    /// API key, sent as a bearer token.
    pub api_key: String,
    /// Model identifier (e.g. `llama3-70b-8192`).
    pub model: String,
}

/// A message in a conversation.
///
/// Turns are immutable once created; their order within a conversation is
/// chronological and significant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content of the message.
    pub content: String,
}

impl Message {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// Trait for non-streaming chat models.
///
/// Implementations produce exactly one assistant reply per call. Callers are
/// expected to convert errors into a user-facing fallback; nothing here is
/// retried.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce one assistant reply for the given message sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no
    /// assistant content.
    async fn complete(&self, messages: &[Message]) -> anyhow::Result<String>;
}
