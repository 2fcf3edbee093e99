//! Web transport: routes, request parsing, and response formatting.
//!
//! Three POST routes drive the assistant (`/chat`, `/voice_input`,
//! `/clear_history`) plus the landing page and static assets. Responses are
//! either MP3 audio with the reply echoed in a sanitized header, or JSON.
//! Nothing below this layer lets an error escape uncaught; handlers only
//! translate outcomes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::Cli;
use crate::context::geo::{self, REGION_PLACEHOLDER};
use crate::orchestrator::{Orchestrator, TurnOutcome};
use crate::session::{CookieSigner, SESSION_COOKIE, SessionStore};
use crate::speech::{RecognitionError, SpeechToText, VoiceGender};

/// Spoken reply when a voice upload yields no transcript.
const STT_APOLOGY_TEXT: &str = "Sorry, I couldn't understand the audio.";

/// Header value substituted when the reply cannot be encoded at all.
const FALLBACK_HEADER_TEXT: &str = "Response generated.";

/// Upper bound on request bodies (voice uploads included).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Whole-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How often idle sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// The AI-dependent collaborators, absent when the chat credential is
/// missing (those routes then answer 500).
pub struct AiServices {
    /// Request-handling core.
    pub orchestrator: Arc<Orchestrator>,
    /// Voice upload transcription.
    pub recognizer: Arc<dyn SpeechToText>,
}

impl std::fmt::Debug for AiServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiServices")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// AI collaborators; `None` when unconfigured.
    pub ai: Option<Arc<AiServices>>,
    /// Session store for conversation state.
    pub sessions: SessionStore,
    /// Session cookie signer.
    pub cookies: CookieSigner,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/voice_input", post(voice_input_handler))
        .route("/clear_history", post(clear_history_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Start the server with the given configuration and state.
pub async fn start_server(cli: &Cli, state: AppState) -> anyhow::Result<()> {
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                tracing::debug!(removed, "swept expired sessions");
            }
        }
    });

    let app = router(state);
    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat route.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    #[serde(default)]
    message: Option<String>,
    /// Requested voice gender (`male`/`female`).
    #[serde(default)]
    voice_gender: Option<String>,
    /// Region selection carried by the client.
    #[serde(default)]
    selected_state: Option<String>,
}

/// POST /chat - one text turn.
async fn chat_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ChatRequest>,
) -> Response {
    let Some(ai) = state.ai.clone() else {
        return error_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI Client not initialized. Check API Key.",
        );
    };

    let Some(message) = req.message.filter(|m| !m.trim().is_empty()) else {
        return error_json(StatusCode::BAD_REQUEST, "No message provided");
    };

    let gender = VoiceGender::parse(req.voice_gender.as_deref().unwrap_or_default());
    let (jar, session) = resolve_session(&state, jar);

    tracing::info!(
        session_id = %session.id(),
        message_length = message.len(),
        "Received chat request"
    );

    let outcome = ai
        .orchestrator
        .run_turn(&session, &message, gender, req.selected_state.as_deref())
        .await;

    (jar, turn_response(&outcome)).into_response()
}

/// POST /voice_input - one voice turn from a multipart upload.
async fn voice_input_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let Some(ai) = state.ai.clone() else {
        return error_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI Client not initialized. Check API Key.",
        );
    };

    let mut audio_bytes: Option<Vec<u8>> = None;
    let mut selected_state: Option<String> = None;
    let mut gender = VoiceGender::Male;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().map(ToString::to_string);
                match name.as_deref() {
                    Some("audio_data") => match field.bytes().await {
                        Ok(bytes) => audio_bytes = Some(bytes.to_vec()),
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to read voice upload");
                            return error_json(StatusCode::BAD_REQUEST, "No audio data found");
                        }
                    },
                    Some("selected_state") => {
                        selected_state = field.text().await.ok().filter(|s| !s.is_empty());
                    }
                    Some("voice_gender") => {
                        if let Ok(value) = field.text().await {
                            gender = VoiceGender::parse(&value);
                        }
                    }
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed multipart body");
                return error_json(StatusCode::BAD_REQUEST, "No audio data found");
            }
        }
    }

    let Some(audio) = audio_bytes.filter(|b| !b.is_empty()) else {
        return error_json(StatusCode::BAD_REQUEST, "No audio data found");
    };

    tracing::info!(audio_bytes = audio.len(), "Received voice input");

    let transcript = match ai.recognizer.transcribe(&audio).await {
        Ok(text) => text,
        Err(e) => {
            match &e {
                RecognitionError::UnintelligibleAudio => {
                    tracing::info!("voice upload produced no transcript");
                }
                RecognitionError::ServiceUnavailable(_) | RecognitionError::TranscodeFailed(_) => {
                    tracing::warn!(error = %e, "speech recognition failed");
                }
            }
            return spoken_error(&ai, STT_APOLOGY_TEXT, gender, StatusCode::BAD_REQUEST).await;
        }
    };

    let (jar, session) = resolve_session(&state, jar);
    let outcome = ai
        .orchestrator
        .run_turn(&session, &transcript, gender, selected_state.as_deref())
        .await;

    (jar, turn_response(&outcome)).into_response()
}

/// POST /clear_history - drop stored conversation history.
///
/// Always succeeds; the message only reports whether anything existed.
async fn clear_history_handler(State(state): State<AppState>, jar: CookieJar) -> Json<serde_json::Value> {
    let cleared = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.cookies.verify(cookie.value()))
        .and_then(|sid| state.sessions.get(&sid))
        .is_some_and(|session| session.clear_history());

    let message = if cleared {
        "Server-side history cleared"
    } else {
        "No server-side history to clear"
    };

    tracing::info!(cleared, "clear history requested");
    Json(json!({ "message": message }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Session resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve the caller's session from the signed cookie, issuing a fresh
/// session (and cookie) when the cookie is absent or fails verification.
fn resolve_session(state: &AppState, jar: CookieJar) -> (CookieJar, crate::session::Session) {
    if let Some(sid) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.cookies.verify(cookie.value()))
    {
        return (jar, state.sessions.get_or_create(&sid));
    }

    let session = state.sessions.create();
    tracing::debug!(session_id = %session.id(), "issued new session");

    let jar = match state.cookies.issue(session.id()) {
        Some(token) => jar.add(
            Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
        ),
        None => jar,
    };

    (jar, session)
}

// ─────────────────────────────────────────────────────────────────────────────
// Response formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Translate a turn outcome into the wire response.
///
/// Audio wins when synthesis succeeded; otherwise the reply text travels as
/// JSON. A model failure keeps the same shapes but answers 500.
fn turn_response(outcome: &TurnOutcome) -> Response {
    let status = if outcome.model_failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    match &outcome.audio {
        Some(audio) => audio_response(status, audio.clone(), &outcome.reply_text),
        None if outcome.model_failed => error_json(status, &outcome.reply_text),
        None => (
            status,
            Json(json!({ "response_text": outcome.reply_text })),
        )
            .into_response(),
    }
}

/// Build an `audio/mpeg` response with the reply echoed in a header.
fn audio_response(status: StatusCode, audio: Vec<u8>, reply_text: &str) -> Response {
    let mut resp = (status, audio).into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(
        HeaderName::from_static("x-response-text"),
        response_text_header(reply_text),
    );
    resp
}

/// Build a structured error response.
fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Speak an error phrase, falling back to JSON when synthesis fails.
async fn spoken_error(
    ai: &AiServices,
    text: &str,
    gender: VoiceGender,
    status: StatusCode,
) -> Response {
    match ai.orchestrator.speak(text, gender).await {
        Some(audio) => audio_response(status, audio, text),
        None => error_json(status, text),
    }
}

/// Sanitize reply text for header transport: drop non-ASCII characters and
/// flatten newlines to spaces.
fn sanitize_header_text(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii)
        .collect::<String>()
        .replace('\n', " ")
}

/// Encode the reply for the `X-Response-Text` header, substituting a generic
/// placeholder when the sanitized text still cannot be encoded.
fn response_text_header(text: &str) -> HeaderValue {
    HeaderValue::from_str(&sanitize_header_text(text))
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_HEADER_TEXT))
}

// ─────────────────────────────────────────────────────────────────────────────
// Landing page
// ─────────────────────────────────────────────────────────────────────────────

/// Index page handler.
async fn index_handler() -> Html<String> {
    Html(landing_page())
}

/// Render the landing page with the selectable region names.
fn landing_page() -> String {
    let options: String = std::iter::once(REGION_PLACEHOLDER.to_string())
        .chain(geo::region_names())
        .map(|name| format!("                    <option value=\"{name}\">{name}</option>\n"))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Naru - a conversational voice assistant">
    <title>Naru</title>
    <link rel="stylesheet" href="/static/css/style.css">
    <script defer src="/static/js/app.js"></script>
</head>
<body>
    <div class="app">
        <header class="topbar">
            <h1>Naru</h1>
            <div class="controls">
                <select id="state-select" title="Your state">
{options}                </select>
                <select id="voice-gender" title="Voice">
                    <option value="male">Male voice</option>
                    <option value="female">Female voice</option>
                </select>
                <button id="clear-chat-button" type="button">Clear chat</button>
            </div>
        </header>

        <main id="chat-history" aria-live="polite"></main>

        <footer class="input-area">
            <textarea id="user-input" rows="1" placeholder="Type a message..."></textarea>
            <button id="send-button" type="button">Send</button>
            <button id="record-button" type="button" title="Hold to talk">&#127908;</button>
        </footer>

        <audio id="audio-player" hidden></audio>
        <div id="status" role="status"></div>
    </div>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizer_drops_non_ascii_and_flattens_newlines() {
        assert_eq!(sanitize_header_text("Héllo\nworld"), "Hllo world");
        assert_eq!(sanitize_header_text("plain text"), "plain text");
        assert_eq!(sanitize_header_text("नमस्ते"), "");
    }

    #[test]
    fn header_encoding_falls_back_on_unencodable_text() {
        // Carriage returns survive sanitization but are invalid in headers.
        let value = response_text_header("line one\rline two");
        assert_eq!(value.to_str().unwrap(), FALLBACK_HEADER_TEXT);

        let value = response_text_header("Hey bro!");
        assert_eq!(value.to_str().unwrap(), "Hey bro!");
    }

    #[test]
    fn landing_page_lists_placeholder_first() {
        let page = landing_page();
        let placeholder_pos = page.find("Select State").unwrap();
        let first_region_pos = page.find("Andaman And Nicobar Islands").unwrap();
        assert!(placeholder_pos < first_region_pos);
        assert!(page.contains("Tamil Nadu"));
        assert!(page.contains("voice-gender"));
    }
}
