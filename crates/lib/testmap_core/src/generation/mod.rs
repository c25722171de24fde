//! Text generation: the opaque language-model capability used to describe
//! test sources, rank reuse candidates, and draft new test scenarios.
//!
//! Providers mirror the embedding module: `"openai"` (chat completions),
//! `"ollama"` (`/api/generate`), and `"local"` (deterministic, offline).

pub mod config;
pub mod local;
pub mod ollama;
pub mod openai;
pub mod prompts;
pub mod provider;

use async_trait::async_trait;

use crate::provider::ProviderError;

/// Produces free text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Provider identifier for logging.
    fn name(&self) -> &str;
}

/// Trim a completion and reject it when nothing is left.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, ProviderError> {
    match text.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(ProviderError::EmptyResponse),
    }
}
