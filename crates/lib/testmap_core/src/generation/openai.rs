//! OpenAI chat-completions generator.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, sleep};
use tracing::debug;

use super::config::GenerationConfig;
use super::{TextGenerator, non_empty};
use crate::provider::{ProviderError, status_error};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Generates text through the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_attempts: u32,
}

impl OpenAiGenerator {
    /// Build from config; fails when no API key is configured.
    pub fn from_config(client: Client, config: &GenerationConfig) -> Result<Self, ProviderError> {
        let api_key = config.openai_api_key.clone().ok_or_else(|| {
            ProviderError::Config("OPENAI_API_KEY is required for openai provider".to_string())
        })?;
        Ok(Self {
            client,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Override the number of attempts per call (minimum 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: [ChatMessage {
                    role: "user",
                    content: prompt,
                }],
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
            return Err(status_error("OpenAI chat completion failed", status, &body));
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("OpenAI response parse error: {e}")))?;

        non_empty(
            data.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
        )
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match self.complete_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    debug!(attempt, error = %e, "OpenAI completion attempt failed");
                    last_error = Some(e);
                }
            }

            if attempt + 1 < self.max_attempts {
                sleep(Duration::from_secs(2u64.pow(attempt + 1))).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::Unavailable(format!(
                "Failed to generate after {} attempts",
                self.max_attempts
            ))
        }))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
