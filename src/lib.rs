//! Naru — a conversational web voice assistant.
//!
//! A thin integration layer that relays user text or voice input to a hosted
//! chat-completion endpoint, enriches the prompt with ambient context (time,
//! location-derived weather), and returns the reply as synthesized speech or
//! text.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP transport with signed session cookies
//! - **Orchestrator**: per-turn pipeline of context assembly, model
//!   invocation, history upkeep, and reply synthesis
//! - **Adapters**: outbound clients for weather, movie search, speech
//!   recognition, and speech synthesis, each degrading into placeholder
//!   values instead of surfacing errors
//!
//! # Modules
//!
//! - [`config`]: CLI flags and environment credentials
//! - [`context`]: location, weather, and system prompt assembly
//! - [`llm`]: chat-completion client
//! - [`movies`]: standalone movie search capability
//! - [`orchestrator`]: the request-handling core
//! - [`server`]: HTTP routes and response formatting
//! - [`session`]: per-user conversation state
//! - [`speech`]: speech-to-text and text-to-speech adapters

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod context;
pub mod llm;
pub mod movies;
pub mod orchestrator;
pub mod server;
pub mod session;
pub mod speech;

pub use server::{AiServices, AppState};
