//! Local deterministic embedding provider using FNV-1a hash.
//!
//! Produces repeatable embeddings with no external dependencies: useful for
//! offline development. Vectors are not semantically meaningful.

use async_trait::async_trait;

use super::Embedder;
use crate::provider::ProviderError;

/// Generate a deterministic embedding for a single text using FNV-1a hashing.
///
/// The algorithm seeds an FNV-1a hash from the input text, then uses an
/// xorshift PRNG to fill the vector with values in `[-1, 1]`.
pub fn embed(text: &str, dimensions: usize) -> Vec<f32> {
    let mut seed: u32 = 2_166_136_261;
    for byte in text.bytes() {
        seed ^= byte as u32;
        seed = seed.wrapping_mul(16_777_619);
    }

    let mut vector = Vec::with_capacity(dimensions);
    let mut x = seed;
    for _ in 0..dimensions {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        let normalized = (x as f64) / (u32::MAX as f64);
        vector.push((normalized * 2.0 - 1.0) as f32);
    }

    vector
}

/// [`Embedder`] backed by [`embed`].
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(embed(text, self.dimensions))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_is_deterministic() {
        let a = embed("hello world", 768);
        let b = embed("hello world", 768);
        assert_eq!(a, b);
    }

    #[test]
    fn embed_correct_dimensions() {
        assert_eq!(embed("test", 1536).len(), 1536);
        assert_eq!(embed("test", 768).len(), 768);
    }

    #[test]
    fn different_texts_produce_different_embeddings() {
        assert_ne!(embed("hello", 768), embed("world", 768));
    }

    #[test]
    fn values_in_expected_range() {
        for val in embed("test embedding range", 768) {
            assert!(
                (-1.0..=1.0).contains(&val),
                "value {val} out of [-1, 1] range"
            );
        }
    }

    #[tokio::test]
    async fn embedder_reports_its_dimension() {
        let embedder = LocalEmbedder::new(64);
        let v = embedder.embed("Saving a probability record").await.unwrap();
        assert_eq!(v.len(), embedder.dimensions());
    }
}
