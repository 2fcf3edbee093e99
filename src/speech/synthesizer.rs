//! Text-to-speech adapter.
//!
//! Streams MP3 audio from an OpenAI-compatible `/v1/audio/speech` endpoint
//! and concatenates the chunks into one buffer. The caller only ever sees a
//! complete buffer or `None`; no partial audio escapes.

use futures::StreamExt;

use super::{SpeechSettings, TextToSpeech, VoiceGender};

/// Voice identity used for the male (default) selection.
const VOICE_MALE: &str = "en-IN-PrabhatNeural";

/// Voice identity used for the female selection.
const VOICE_FEMALE: &str = "en-IN-NeerjaNeural";

/// Playback rate multiplier: +12% over baseline.
const SPEECH_RATE: f64 = 1.12;

/// Streaming speech synthesizer.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    http: reqwest::Client,
    settings: SpeechSettings,
}

impl std::fmt::Debug for SpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesizer")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.tts_model)
            .finish()
    }
}

impl SpeechSynthesizer {
    /// Create a synthesizer with the given HTTP client and settings.
    #[must_use]
    pub fn new(http: reqwest::Client, settings: SpeechSettings) -> Self {
        Self { http, settings }
    }
}

/// Map the gender selector to one of the two fixed voice identities.
fn voice_for(gender: VoiceGender) -> &'static str {
    match gender {
        VoiceGender::Male => VOICE_MALE,
        VoiceGender::Female => VOICE_FEMALE,
    }
}

#[async_trait::async_trait]
impl TextToSpeech for SpeechSynthesizer {
    async fn synthesize(&self, text: &str, gender: VoiceGender) -> Option<Vec<u8>> {
        let url = format!(
            "{}/v1/audio/speech",
            self.settings.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": self.settings.tts_model,
            "input": text,
            "voice": voice_for(gender),
            "speed": SPEECH_RATE,
            "response_format": "mp3",
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis request failed");
                return None;
            }
        };

        let mut audio = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => audio.extend_from_slice(&bytes),
                Err(e) => {
                    tracing::warn!(error = %e, "speech synthesis stream interrupted");
                    return None;
                }
            }
        }

        if audio.is_empty() {
            tracing::warn!("speech synthesis produced no audio");
            return None;
        }

        tracing::debug!(audio_bytes = audio.len(), "synthesized reply audio");
        Some(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_maps_to_fixed_voices() {
        assert_eq!(voice_for(VoiceGender::Male), "en-IN-PrabhatNeural");
        assert_eq!(voice_for(VoiceGender::Female), "en-IN-NeerjaNeural");
    }

    #[tokio::test]
    async fn unreachable_backend_returns_none() {
        let synth = SpeechSynthesizer::new(
            reqwest::Client::new(),
            SpeechSettings {
                base_url: "http://127.0.0.1:1".to_string(),
                api_key: "test".to_string(),
                stt_model: "whisper-large-v3".to_string(),
                tts_model: "tts-1".to_string(),
            },
        );
        assert!(synth.synthesize("hello", VoiceGender::Male).await.is_none());
    }
}
