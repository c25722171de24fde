//! Text generation configuration resolution from environment variables.

use std::env;

use crate::embedding::config::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OPENAI_BASE_URL};

/// Default OpenAI chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// Default Ollama generation model.
pub const DEFAULT_OLLAMA_CHAT_MODEL: &str = "llama3.1";

/// Resolved configuration for which generation provider/model to use.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Provider name: `"openai"`, `"ollama"`, or `"local"`.
    pub provider: String,
    /// Chat/completion model name.
    pub model: String,
    pub ollama_base_url: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
}

impl GenerationConfig {
    /// Resolve from environment variables.
    ///
    /// `GENERATION_PROVIDER` defaults to `openai` when `OPENAI_API_KEY` is
    /// set, else `local`. `CHAT_MODEL` defaults per provider.
    pub fn from_env() -> Self {
        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        let provider = env::var("GENERATION_PROVIDER").unwrap_or_else(|_| {
            if openai_api_key.is_some() {
                "openai".to_string()
            } else {
                "local".to_string()
            }
        });

        let model = env::var("CHAT_MODEL").unwrap_or_else(|_| match provider.as_str() {
            "ollama" => DEFAULT_OLLAMA_CHAT_MODEL.to_string(),
            "local" => "local-echo".to_string(),
            _ => DEFAULT_CHAT_MODEL.to_string(),
        });

        Self {
            provider,
            model,
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_api_key,
        }
    }

    /// Offline configuration using the deterministic local generator.
    pub fn local() -> Self {
        Self {
            provider: "local".to_string(),
            model: "local-echo".to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_api_key: None,
        }
    }
}
