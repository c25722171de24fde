//! Embedding configuration resolution from environment variables.

use std::env;

use crate::provider::ProviderError;

/// Default OpenAI embedding model.
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// Default Ollama embedding model.
pub const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text";

/// Default embedding dimension (matches the `vector(1536)` column).
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// Default Ollama API base URL.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Resolved configuration for which embedding provider/model to use.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Provider name: `"openai"`, `"ollama"`, or `"local"`.
    pub provider: String,
    /// Model name passed to the provider.
    pub model: String,
    /// Vector dimension for every embedding in this deployment.
    pub dimensions: usize,
    /// Ollama API base URL.
    pub ollama_base_url: String,
    /// OpenAI API base URL (overridable for proxies and tests).
    pub openai_base_url: String,
    /// OpenAI API key (required when provider is `"openai"`).
    pub openai_api_key: Option<String>,
}

impl EmbeddingConfig {
    /// Resolve from environment variables.
    ///
    /// | Variable               | Default                                   |
    /// |------------------------|-------------------------------------------|
    /// | `EMBEDDING_PROVIDER`   | `openai` if `OPENAI_API_KEY` set, else `local` |
    /// | `EMBEDDING_MODEL`      | provider default                          |
    /// | `EMBEDDING_DIMENSIONS` | `1536`                                    |
    /// | `OLLAMA_BASE_URL`      | `http://localhost:11434`                  |
    /// | `OPENAI_BASE_URL`      | `https://api.openai.com/v1`               |
    ///
    /// An `EMBEDDING_DIMENSIONS` that is not a positive integer is a
    /// [`ProviderError::Config`].
    pub fn from_env() -> Result<Self, ProviderError> {
        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        let provider = env::var("EMBEDDING_PROVIDER").unwrap_or_else(|_| {
            if openai_api_key.is_some() {
                "openai".to_string()
            } else {
                "local".to_string()
            }
        });

        let model = env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| default_model_for(&provider).to_string());

        let dimensions = parse_dimensions(env::var("EMBEDDING_DIMENSIONS").ok())?;

        Ok(Self {
            provider,
            model,
            dimensions,
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_api_key,
        })
    }

    /// Offline configuration using the deterministic local provider.
    pub fn local(dimensions: usize) -> Self {
        Self {
            provider: "local".to_string(),
            model: "local-fnv".to_string(),
            dimensions,
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_api_key: None,
        }
    }
}

fn parse_dimensions(value: Option<String>) -> Result<usize, ProviderError> {
    let Some(raw) = value else {
        return Ok(DEFAULT_DIMENSIONS);
    };
    match raw.trim().parse::<usize>() {
        Ok(dimensions) if dimensions > 0 => Ok(dimensions),
        _ => Err(ProviderError::Config(format!(
            "invalid value for EMBEDDING_DIMENSIONS: {raw:?}"
        ))),
    }
}

fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "ollama" => DEFAULT_OLLAMA_MODEL,
        "local" => "local-fnv",
        _ => DEFAULT_OPENAI_MODEL,
    }
}
