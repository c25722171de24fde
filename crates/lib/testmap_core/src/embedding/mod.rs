//! Embedding module: text embedding generation for test descriptions and
//! incoming issue reports.
//!
//! Supports multiple providers (OpenAI, Ollama, local/deterministic) behind
//! the [`Embedder`] trait so the mapping and indexing engines never depend on
//! a concrete vendor.
//!
//! # Providers
//!
//! - `"openai"`: OpenAI API (`text-embedding-3-small`)
//! - `"ollama"`: Ollama local API (`nomic-embed-text`)
//! - `"local"`: Deterministic FNV-1a hash (offline, no external deps)

pub mod config;
pub mod local;
pub mod ollama;
pub mod openai;
pub mod provider;

use async_trait::async_trait;

use crate::provider::ProviderError;

/// Converts text into a dense vector of fixed dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Dimension of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Provider identifier for logging.
    fn name(&self) -> &str;
}

/// Reject a vector whose length differs from the configured dimension.
pub(crate) fn check_dimensions(
    embedding: Vec<f32>,
    expected: usize,
) -> Result<Vec<f32>, ProviderError> {
    if embedding.len() != expected {
        return Err(ProviderError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}
