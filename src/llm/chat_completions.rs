//! OpenAI Chat Completions API client.
//!
//! This module implements the [`ChatModel`] trait for OpenAI-compatible
//! Chat Completions endpoints (`/v1/chat/completions`), non-streaming.

use anyhow::Context;
use serde::Deserialize;

use super::{ChatModel, ChatSettings, Message};

/// Sampling temperature applied to every completion request.
const TEMPERATURE: f64 = 0.7;

/// Upper bound on generated tokens per reply.
const MAX_TOKENS: u32 = 500;

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    settings: ChatSettings,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish()
    }
}

impl ChatCompletionsClient {
    /// Create a new client with the given HTTP client and settings.
    ///
    /// The shared `reqwest` client carries the configured upstream timeout.
    #[must_use]
    pub fn new(http: reqwest::Client, settings: ChatSettings) -> Self {
        Self { http, settings }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[async_trait::async_trait]
impl ChatModel for ChatCompletionsClient {
    async fn complete(&self, messages: &[Message]) -> anyhow::Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned error status")?;

        let parsed: CompletionResponse = resp
            .json()
            .await
            .context("malformed chat completion payload")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("completion response contained no assistant content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completion_payload() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Bhai kya scene hai?"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;

        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Bhai kya scene hai?")
        );
    }

    #[test]
    fn missing_content_is_none() {
        let raw = r#"{"choices": [{"message": {"role": "assistant"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
