//! Provider dispatch: builds the configured [`Embedder`].

use std::sync::Arc;

use reqwest::Client;

use super::config::EmbeddingConfig;
use super::local::LocalEmbedder;
use super::ollama::OllamaEmbedder;
use super::openai::OpenAiEmbedder;
use super::Embedder;
use crate::provider::ProviderError;

/// Build an embedder for `config.provider`:
/// - `"openai"` → OpenAI API with retry
/// - `"ollama"` → Ollama local API
/// - `"local"` → deterministic FNV hash
pub fn from_config(
    client: &Client,
    config: &EmbeddingConfig,
) -> Result<Arc<dyn Embedder>, ProviderError> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(LocalEmbedder::new(config.dimensions))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::from_config(client.clone(), config))),
        "openai" => Ok(Arc::new(OpenAiEmbedder::from_config(client.clone(), config)?)),
        other => Err(ProviderError::UnsupportedProvider(other.to_string())),
    }
}
