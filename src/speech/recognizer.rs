//! Speech-to-text adapter.
//!
//! Transcodes the browser's WebM upload to WAV with an `ffmpeg` subprocess,
//! then submits the WAV to an OpenAI-compatible `/v1/audio/transcriptions`
//! endpoint as multipart form data.

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{RecognitionError, SpeechSettings, SpeechToText};

/// Client-side speech recognizer backed by ffmpeg + a transcription API.
#[derive(Clone)]
pub struct SpeechRecognizer {
    http: reqwest::Client,
    settings: SpeechSettings,
}

impl std::fmt::Debug for SpeechRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechRecognizer")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.stt_model)
            .finish()
    }
}

#[derive(Debug, serde::Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl SpeechRecognizer {
    /// Create a recognizer with the given HTTP client and settings.
    #[must_use]
    pub fn new(http: reqwest::Client, settings: SpeechSettings) -> Self {
        Self { http, settings }
    }

    /// Convert a WebM blob to WAV by piping it through ffmpeg.
    async fn transcode_to_wav(audio_webm: &[u8]) -> Result<Vec<u8>, RecognitionError> {
        let mut child = Command::new("ffmpeg")
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "pipe:0",
                "-f",
                "wav",
                "pipe:1",
            ])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecognitionError::TranscodeFailed(
                        "ffmpeg not found; install it and make sure it is on PATH".to_string(),
                    )
                } else {
                    RecognitionError::TranscodeFailed(format!("failed to spawn ffmpeg: {e}"))
                }
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RecognitionError::TranscodeFailed("missing ffmpeg stdin".to_string()))?;

        // Feed stdin from a task so a full stdout pipe can't deadlock us.
        let input = audio_webm.to_vec();
        let writer = tokio::spawn(async move {
            let _ = stdin.write_all(&input).await;
            let _ = stdin.shutdown().await;
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RecognitionError::TranscodeFailed(format!("ffmpeg failed: {e}")))?;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::TranscodeFailed(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait::async_trait]
impl SpeechToText for SpeechRecognizer {
    async fn transcribe(&self, audio_webm: &[u8]) -> Result<String, RecognitionError> {
        let wav = Self::transcode_to_wav(audio_webm).await?;
        tracing::debug!(
            webm_bytes = audio_webm.len(),
            wav_bytes = wav.len(),
            "transcoded voice upload"
        );

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.settings.base_url.trim_end_matches('/')
        );

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| RecognitionError::ServiceUnavailable(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.settings.stt_model.clone());

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RecognitionError::ServiceUnavailable(e.to_string()))?;

        let parsed: TranscriptionResponse = resp
            .json()
            .await
            .map_err(|e| RecognitionError::ServiceUnavailable(e.to_string()))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(RecognitionError::UnintelligibleAudio);
        }

        tracing::info!(transcript = %text, "recognized voice input");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcription_payload_parses() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text": "kal ka weather kaisa hai"}"#).unwrap();
        assert_eq!(parsed.text, "kal ka weather kaisa hai");
    }

    #[test]
    fn transcription_payload_tolerates_missing_text() {
        let parsed: TranscriptionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.text.is_empty());
    }

    #[tokio::test]
    async fn garbage_input_is_a_transcode_failure() {
        // Either ffmpeg is absent (spawn failure) or it rejects the bytes;
        // both surface as TranscodeFailed.
        let result = SpeechRecognizer::transcode_to_wav(b"not really webm").await;
        assert!(matches!(result, Err(RecognitionError::TranscodeFailed(_))));
    }
}
