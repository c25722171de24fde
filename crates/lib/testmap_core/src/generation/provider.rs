//! Provider dispatch: builds the configured [`TextGenerator`].

use std::sync::Arc;

use reqwest::Client;

use super::TextGenerator;
use super::config::GenerationConfig;
use super::local::LocalGenerator;
use super::ollama::OllamaGenerator;
use super::openai::OpenAiGenerator;
use crate::provider::ProviderError;

/// Build a generator for `config.provider` (`"openai"`, `"ollama"`, `"local"`).
pub fn from_config(
    client: &Client,
    config: &GenerationConfig,
) -> Result<Arc<dyn TextGenerator>, ProviderError> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(LocalGenerator)),
        "ollama" => Ok(Arc::new(OllamaGenerator::from_config(client.clone(), config))),
        "openai" => Ok(Arc::new(OpenAiGenerator::from_config(client.clone(), config)?)),
        other => Err(ProviderError::UnsupportedProvider(other.to_string())),
    }
}
