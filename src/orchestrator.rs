//! Conversation orchestrator.
//!
//! Turns one user input into one model reply and one response payload:
//! 1. Apply any region selection carried by the request to the session
//! 2. Resolve location and weather for the session's region
//! 3. Build the system prompt (persona + time + location + weather)
//! 4. Invoke the chat model over [system] + history + new user turn
//! 5. Strip markdown asterisks for speech-friendliness
//! 6. Record the exchange in bounded session history
//! 7. Attempt speech synthesis on the reply
//!
//! Failures never abort a turn. A model failure substitutes a fixed apology
//! that flows through the same remaining pipeline, so errors get spoken
//! rather than just logged; context failures degrade into placeholder text
//! before the model is ever called.

use std::sync::Arc;

use crate::context::{PromptContext, WeatherClient, geo};
use crate::llm::{ChatModel, Message};
use crate::session::Session;
use crate::speech::{TextToSpeech, VoiceGender};

/// Reply substituted when the chat model fails.
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error trying to respond.";

/// Outcome of one conversation turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Final reply text, asterisk-stripped.
    pub reply_text: String,
    /// Synthesized MP3 audio, when synthesis succeeded.
    pub audio: Option<Vec<u8>>,
    /// Whether the reply is the apology substituted for a model failure.
    pub model_failed: bool,
}

/// The request-handling core: context assembly, model invocation, history
/// upkeep, and reply synthesis.
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    synthesizer: Arc<dyn TextToSpeech>,
    weather: WeatherClient,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("weather", &self.weather)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        model: Arc<dyn ChatModel>,
        synthesizer: Arc<dyn TextToSpeech>,
        weather: WeatherClient,
    ) -> Self {
        Self {
            model,
            synthesizer,
            weather,
        }
    }

    /// Run one conversation turn for the given session.
    ///
    /// `selected_region`, when present, overwrites the session's region
    /// before resolution; the client is authoritative about geography.
    pub async fn run_turn(
        &self,
        session: &Session,
        user_text: &str,
        gender: VoiceGender,
        selected_region: Option<&str>,
    ) -> TurnOutcome {
        if let Some(region) = selected_region {
            tracing::debug!(session_id = %session.id(), region = %region, "updated session region");
            session.set_selected_region(region);
        }

        let region = session.selected_region();
        let location = geo::resolve(region.as_deref());
        let weather = self
            .weather
            .fetch(location.latitude, location.longitude)
            .await;
        let system_prompt = PromptContext::new(location.display_name, weather).render();

        let mut messages = Vec::with_capacity(session.history().len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(session.history());
        messages.push(Message::user(user_text));

        tracing::info!(
            session_id = %session.id(),
            message_count = messages.len(),
            "invoking chat model"
        );

        let (reply_text, model_failed) = match self.model.complete(&messages).await {
            Ok(text) => (text.replace('*', ""), false),
            Err(e) => {
                tracing::error!(session_id = %session.id(), error = %e, "chat completion failed");
                (APOLOGY_TEXT.to_string(), true)
            }
        };

        session.record_exchange(user_text, &reply_text);

        let audio = self.synthesizer.synthesize(&reply_text, gender).await;

        TurnOutcome {
            reply_text,
            audio,
            model_failed,
        }
    }

    /// Synthesize a standalone phrase outside the turn pipeline (used for
    /// spoken error responses).
    pub async fn speak(&self, text: &str, gender: VoiceGender) -> Option<Vec<u8>> {
        self.synthesizer.synthesize(text, gender).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;
    use crate::session::SessionStore;

    struct FixedModel {
        reply: Option<String>,
        seen: std::sync::Mutex<Vec<Vec<Message>>>,
    }

    impl FixedModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, messages: &[Message]) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply
                .clone()
                .ok_or_else(|| anyhow::anyhow!("model exploded"))
        }
    }

    struct NoAudio;

    #[async_trait::async_trait]
    impl TextToSpeech for NoAudio {
        async fn synthesize(&self, _text: &str, _gender: VoiceGender) -> Option<Vec<u8>> {
            None
        }
    }

    fn orchestrator(model: Arc<FixedModel>) -> Orchestrator {
        // Unroutable weather endpoint: context degrades to placeholders.
        let weather = WeatherClient::with_base_url(reqwest::Client::new(), "http://127.0.0.1:1");
        Orchestrator::new(model, Arc::new(NoAudio), weather)
    }

    #[tokio::test]
    async fn successful_turn_records_exchange() {
        let model = Arc::new(FixedModel::replying("Hey *bro*!"));
        let orch = orchestrator(Arc::clone(&model));
        let session = SessionStore::new().create();

        let outcome = orch.run_turn(&session, "hi", VoiceGender::Male, None).await;

        assert_eq!(outcome.reply_text, "Hey bro!");
        assert!(!outcome.model_failed);
        assert!(outcome.audio.is_none());

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].content, "Hey bro!");
    }

    #[tokio::test]
    async fn system_prompt_leads_and_is_not_stored() {
        let model = Arc::new(FixedModel::replying("ok"));
        let orch = orchestrator(Arc::clone(&model));
        let session = SessionStore::new().create();

        orch.run_turn(&session, "first", VoiceGender::Male, None).await;
        orch.run_turn(&session, "second", VoiceGender::Male, None).await;

        let seen = model.seen.lock().unwrap();
        // Second call: [system] + 2 history turns + new user turn.
        let second = &seen[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].role, MessageRole::System);
        assert!(second[0].content.contains("Tu hai Naru"));
        assert_eq!(second[1].content, "first");
        assert_eq!(second[3].content, "second");

        // History holds only user/assistant turns.
        assert!(session
            .history()
            .iter()
            .all(|m| m.role != MessageRole::System));
    }

    #[tokio::test]
    async fn model_failure_substitutes_spoken_apology() {
        let model = Arc::new(FixedModel::failing());
        let orch = orchestrator(model);
        let session = SessionStore::new().create();

        let outcome = orch.run_turn(&session, "hi", VoiceGender::Female, None).await;

        assert!(outcome.model_failed);
        assert_eq!(outcome.reply_text, APOLOGY_TEXT);

        // The apology flows through the same history pipeline.
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn request_region_overwrites_session_region() {
        let model = Arc::new(FixedModel::replying("ok"));
        let orch = orchestrator(Arc::clone(&model));
        let session = SessionStore::new().create();
        session.set_selected_region("Kerala");

        orch.run_turn(&session, "hi", VoiceGender::Male, Some("Tamil Nadu"))
            .await;

        assert_eq!(session.selected_region().as_deref(), Some("Tamil Nadu"));
        let seen = model.seen.lock().unwrap();
        assert!(seen[0][0].content.contains("Tamil Nadu, India"));
    }

    #[tokio::test]
    async fn remembered_region_survives_without_reselection() {
        let model = Arc::new(FixedModel::replying("ok"));
        let orch = orchestrator(Arc::clone(&model));
        let session = SessionStore::new().create();

        orch.run_turn(&session, "hi", VoiceGender::Male, Some("goa")).await;
        orch.run_turn(&session, "again", VoiceGender::Male, None).await;

        let seen = model.seen.lock().unwrap();
        assert!(seen[1][0].content.contains("Goa, India"));
    }
}
