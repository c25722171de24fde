//! Ollama generator (`/api/generate`, non-streaming).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;
use super::{TextGenerator, non_empty};
use crate::provider::ProviderError;

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}

/// Generates text through a local Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn from_config(client: Client, config: &GenerationConfig) -> Self {
        Self {
            client,
            base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&OllamaRequest {
                model: &self.model,
                prompt,
                stream: false,
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
                "Ollama generate failed: {status} {body}"
            )));
        }

        let data: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Ollama response parse error: {e}")))?;

        non_empty(data.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_non_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({ "stream": false })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": "None - nothing fits" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = GenerationConfig::local();
        config.provider = "ollama".to_string();
        config.model = "llama3.1".to_string();
        config.ollama_base_url = server.uri();

        let generator = OllamaGenerator::from_config(Client::new(), &config);
        assert_eq!(
            generator.generate("prompt").await.unwrap(),
            "None - nothing fits"
        );
    }
}
