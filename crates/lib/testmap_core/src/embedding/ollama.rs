//! Ollama embedding provider.
//!
//! Calls the Ollama API (`/api/embeddings`), one prompt per request.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::EmbeddingConfig;
use super::{Embedder, check_dimensions};
use crate::provider::ProviderError;

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Option<Vec<f64>>,
}

/// Embeds text through a local Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn from_config(client: Client, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!("{}/api/embeddings", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(&OllamaRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Ollama request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ProviderError::Unavailable(format!(
                "Ollama embeddings failed: {status} {body}"
            )));
        }

        let data: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Ollama response parse error: {e}")))?;

        let embedding: Vec<f32> = data
            .embedding
            .unwrap_or_default()
            .into_iter()
            .map(|v| v as f32)
            .collect();

        if embedding.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        check_dimensions(embedding, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
