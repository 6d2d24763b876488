//! Provider-agnostic completion client.
//!
//! One entry point, [`GenAiClient::generate_response`], routes a prompt (and
//! an optional JSON schema) to the configured OpenAI- or Claude-style API and
//! returns a [`GenerationResponse`] of the same shape for either provider.

mod adapter;
mod claude;
mod client;
mod config;
mod error;
mod json;
mod openai;
mod session;
mod types;

pub use adapter::ProviderAdapter;
pub use claude::ClaudeAdapter;
pub use client::GenAiClient;
pub use config::{DEFAULT_CLAUDE_BASE_URL, DEFAULT_OPENAI_BASE_URL, GenAiConfig};
pub use error::{LlmError, Result};
pub use json::to_spaced_json;
pub use openai::OpenAiAdapter;
pub use session::SessionHolder;
pub use types::{GenerationResponse, Provider};
