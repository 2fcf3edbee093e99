//! Speech adapters: recognition (audio in) and synthesis (audio out).
//!
//! Both sides are trait seams so the web handlers and orchestrator can be
//! exercised with mock implementations:
//!
//! - [`SpeechToText`]: compressed WebM audio → transcript
//! - [`TextToSpeech`]: reply text → MP3 bytes
//!
//! Recognition failures carry a taxonomy ([`RecognitionError`]) that only
//! matters for diagnostics; every kind collapses to "no transcript" at the
//! call site. Synthesis failures collapse to `None`, letting the caller fall
//! back to a text-only response.

pub mod recognizer;
pub mod synthesizer;

pub use recognizer::SpeechRecognizer;
pub use synthesizer::SpeechSynthesizer;

/// Settings shared by the speech adapters.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    /// Base URL of the OpenAI-compatible audio API.
    pub base_url: String,
    /// API key, sent as a bearer token.
    pub api_key: String,
    /// Transcription model identifier.
    pub stt_model: String,
    /// Synthesis model identifier.
    pub tts_model: String,
}

/// Requested voice gender for synthesized speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceGender {
    /// Male voice (the default).
    #[default]
    Male,
    /// Female voice.
    Female,
}

impl VoiceGender {
    /// Parse a form/JSON field value; anything other than `"female"` is male.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("female") {
            Self::Female
        } else {
            Self::Male
        }
    }
}

/// Why a voice upload produced no transcript.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    /// The audio container could not be converted to WAV.
    #[error("audio transcoding failed: {0}")]
    TranscodeFailed(String),
    /// The recognition service answered but produced no confident transcript.
    #[error("speech service produced no transcript")]
    UnintelligibleAudio,
    /// The recognition service could not be reached or errored.
    #[error("speech service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Decode an uploaded compressed-audio blob into a transcript.
#[async_trait::async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe WebM audio bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`RecognitionError`] describing why no transcript was
    /// produced; callers treat every kind as "no transcript".
    async fn transcribe(&self, audio_webm: &[u8]) -> Result<String, RecognitionError>;
}

/// Convert a text string into compressed audio.
#[async_trait::async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize speech, returning `None` on any failure.
    async fn synthesize(&self, text: &str, gender: VoiceGender) -> Option<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parse_defaults_to_male() {
        assert_eq!(VoiceGender::parse("female"), VoiceGender::Female);
        assert_eq!(VoiceGender::parse("FEMALE"), VoiceGender::Female);
        assert_eq!(VoiceGender::parse("male"), VoiceGender::Male);
        assert_eq!(VoiceGender::parse(""), VoiceGender::Male);
        assert_eq!(VoiceGender::parse("robot"), VoiceGender::Male);
    }
}
