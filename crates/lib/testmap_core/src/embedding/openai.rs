//! OpenAI embedding provider.
//!
//! Calls the OpenAI embeddings API (`/embeddings`) with retry logic
//! (exponential backoff between attempts).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, sleep};
use tracing::debug;

use super::config::EmbeddingConfig;
use super::{Embedder, check_dimensions};
use crate::provider::{ProviderError, status_error};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f64>,
}

/// Embeds text through the OpenAI API.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    max_attempts: u32,
}

impl OpenAiEmbedder {
    /// Build from config; fails when no API key is configured.
    pub fn from_config(client: Client, config: &EmbeddingConfig) -> Result<Self, ProviderError> {
        let api_key = config.openai_api_key.clone().ok_or_else(|| {
            ProviderError::Config("OPENAI_API_KEY is required for openai provider".to_string())
        })?;
        Ok(Self {
            client,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Override the number of attempts per call (minimum 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let resp = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&OpenAIRequest {
                model: &self.model,
                input: text,
                dimensions: self.dimensions,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("OpenAI request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(status_error("OpenAI embeddings failed", status, &body));
        }

        let data: OpenAIResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("OpenAI response parse error: {e}")))?;

        let embedding: Vec<f32> = data
            .data
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?
            .embedding
            .into_iter()
            .map(|v| v as f32)
            .collect();

        check_dimensions(embedding, self.dimensions)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match self.embed_once(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    debug!(attempt, error = %e, "OpenAI embedding attempt failed");
                    last_error = Some(e);
                }
            }

            if attempt + 1 < self.max_attempts {
                let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::Unavailable(format!(
                "Failed to embed after {} attempts",
                self.max_attempts
            ))
        }))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, dimensions: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions,
            ollama_base_url: String::new(),
            openai_base_url: format!("{}/v1", server.uri()),
            openai_api_key: Some("sk-test".to_string()),
        }
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let mut config = EmbeddingConfig::local(3);
        config.provider = "openai".to_string();
        let err = OpenAiEmbedder::from_config(Client::new(), &config).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[tokio::test]
    async fn parses_embedding_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.25, -0.5, 1.0] }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::from_config(Client::new(), &config_for(&server, 3))
            .unwrap()
            .with_max_attempts(1);
        let v = embedder.embed("Saving a record fails").await.unwrap();
        assert_eq!(v, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::from_config(Client::new(), &config_for(&server, 3))
            .unwrap()
            .with_max_attempts(1);
        let err = embedder.embed("anything").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.1, 0.2] }]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::from_config(Client::new(), &config_for(&server, 3))
            .unwrap()
            .with_max_attempts(1);
        let err = embedder.embed("anything").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::from_config(Client::new(), &config_for(&server, 3))
            .unwrap()
            .with_max_attempts(3);
        let err = embedder.embed("anything").await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
    }
}
