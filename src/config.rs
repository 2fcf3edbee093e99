//! Configuration: CLI flags for the server, environment for credentials.
//!
//! Nothing here aborts the process. A missing chat credential leaves the AI
//! routes answering 500 until it is provided; a missing movie credential
//! degrades that one capability; a missing session secret gets an ephemeral
//! replacement (with a startup warning) at the cost of sessions not
//! surviving a restart.

use clap::Parser;
use uuid::Uuid;

use crate::llm::ChatSettings;
use crate::speech::SpeechSettings;

/// Default chat-completion endpoint (Groq's OpenAI-compatible API).
const DEFAULT_CHAT_BASE_URL: &str = "https://api.groq.com/openai";

/// Default chat model identifier.
const DEFAULT_CHAT_MODEL: &str = "llama3-70b-8192";

/// Default transcription model identifier.
const DEFAULT_STT_MODEL: &str = "whisper-large-v3";

/// Default synthesis model identifier.
const DEFAULT_TTS_MODEL: &str = "playai-tts";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Timeout applied to every outbound API call, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,
}

/// Credentials and endpoints for the AI collaborators.
#[derive(Debug, Clone)]
pub struct AiSettings {
    /// Chat-completion endpoint settings.
    pub chat: ChatSettings,
    /// Speech recognition/synthesis endpoint settings (same credential).
    pub speech: SpeechSettings,
}

/// Everything loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// AI settings; `None` when the chat credential is missing.
    pub ai: Option<AiSettings>,
    /// Movie search credential; optional.
    pub tmdb_api_key: Option<String>,
    /// Session cookie signing secret.
    pub session_secret: String,
    /// Whether the secret was generated for this process only.
    pub session_secret_is_ephemeral: bool,
}

impl Settings {
    /// Load settings from the environment.
    #[must_use]
    pub fn load() -> Self {
        let ai = env_nonempty("GROQ_API_KEY").map(|api_key| {
            let chat_base_url =
                env_nonempty("CHAT_BASE_URL").unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string());
            let speech_base_url =
                env_nonempty("SPEECH_BASE_URL").unwrap_or_else(|| chat_base_url.clone());

            AiSettings {
                chat: ChatSettings {
                    base_url: chat_base_url,
                    api_key: api_key.clone(),
                    model: env_nonempty("CHAT_MODEL")
                        .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                },
                speech: SpeechSettings {
                    base_url: speech_base_url,
                    api_key,
                    stt_model: env_nonempty("SPEECH_STT_MODEL")
                        .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
                    tts_model: env_nonempty("SPEECH_TTS_MODEL")
                        .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
                },
            }
        });

        let (session_secret, session_secret_is_ephemeral) = match env_nonempty("SESSION_SECRET") {
            Some(secret) => (secret, false),
            None => (
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
                true,
            ),
        };

        Self {
            ai,
            tmdb_api_key: env_nonempty("TMDB_API_KEY"),
            session_secret,
            session_secret_is_ephemeral,
        }
    }
}

/// Read an environment variable, treating empty values as absent.
fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env_vars() {
        for var in [
            "GROQ_API_KEY",
            "CHAT_BASE_URL",
            "CHAT_MODEL",
            "SPEECH_BASE_URL",
            "SPEECH_STT_MODEL",
            "SPEECH_TTS_MODEL",
            "TMDB_API_KEY",
            "SESSION_SECRET",
        ] {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn missing_chat_credential_disables_ai() {
        clear_env_vars();

        let settings = Settings::load();
        assert!(settings.ai.is_none());
        assert!(settings.tmdb_api_key.is_none());
        assert!(settings.session_secret_is_ephemeral);
        assert!(!settings.session_secret.is_empty());

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn chat_credential_enables_ai_with_defaults() {
        clear_env_vars();
        unsafe {
            std::env::set_var("GROQ_API_KEY", "gsk-test");
        }

        let settings = Settings::load();
        let ai = settings.ai.expect("ai settings");
        assert_eq!(ai.chat.base_url, DEFAULT_CHAT_BASE_URL);
        assert_eq!(ai.chat.model, DEFAULT_CHAT_MODEL);
        assert_eq!(ai.speech.base_url, DEFAULT_CHAT_BASE_URL);
        assert_eq!(ai.speech.stt_model, DEFAULT_STT_MODEL);
        assert_eq!(ai.speech.tts_model, DEFAULT_TTS_MODEL);

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn configured_secret_is_not_ephemeral() {
        clear_env_vars();
        unsafe {
            std::env::set_var("SESSION_SECRET", "persistent-secret");
        }

        let settings = Settings::load();
        assert_eq!(settings.session_secret, "persistent-secret");
        assert!(!settings.session_secret_is_ephemeral);

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn empty_values_count_as_absent() {
        clear_env_vars();
        unsafe {
            std::env::set_var("GROQ_API_KEY", "   ");
        }

        let settings = Settings::load();
        assert!(settings.ai.is_none());

        clear_env_vars();
    }
}
