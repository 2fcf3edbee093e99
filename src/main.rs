//! Naru server entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use naru::config::{Cli, Settings};
use naru::context::WeatherClient;
use naru::llm::ChatCompletionsClient;
use naru::orchestrator::Orchestrator;
use naru::server::{AiServices, AppState, start_server};
use naru::session::{CookieSigner, SessionStore};
use naru::speech::{SpeechRecognizer, SpeechSynthesizer, SpeechToText};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let settings = Settings::load();

    if settings.tmdb_api_key.is_none() {
        tracing::warn!("TMDB_API_KEY not set; movie search will report a configuration error");
    }
    if settings.session_secret_is_ephemeral {
        tracing::warn!(
            "SESSION_SECRET not set; using an ephemeral secret, sessions will not survive a restart"
        );
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.upstream_timeout_secs))
        .build()?;

    let ai = settings.ai.as_ref().map(|ai| {
        info!(
            name: "llm.config.loaded",
            base_url = %ai.chat.base_url,
            model = %ai.chat.model,
            "LLM configuration loaded"
        );

        let model = Arc::new(ChatCompletionsClient::new(http.clone(), ai.chat.clone()));
        let synthesizer = Arc::new(SpeechSynthesizer::new(http.clone(), ai.speech.clone()));
        let recognizer: Arc<dyn SpeechToText> =
            Arc::new(SpeechRecognizer::new(http.clone(), ai.speech.clone()));
        let orchestrator = Arc::new(Orchestrator::new(
            model,
            synthesizer,
            WeatherClient::new(http.clone()),
        ));

        Arc::new(AiServices {
            orchestrator,
            recognizer,
        })
    });

    if ai.is_none() {
        tracing::error!(
            "GROQ_API_KEY not set; chat and voice routes will answer 500 until it is configured"
        );
    }

    let state = AppState {
        ai,
        sessions: SessionStore::new(),
        cookies: CookieSigner::new(&settings.session_secret),
    };

    start_server(&cli, state).await
}
