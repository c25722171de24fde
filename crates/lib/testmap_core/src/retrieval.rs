//! Similarity retrieval: nearest stored tests for a query embedding.

use std::sync::Arc;

use tracing::debug;

use crate::store::{SimilarityMatch, StoreError, VectorStore};

/// Read-only top-K lookup over a [`VectorStore`].
#[derive(Clone)]
pub struct SimilarityRetriever {
    store: Arc<dyn VectorStore>,
}

impl SimilarityRetriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Up to `k` matches ordered by descending similarity.
    ///
    /// An empty store yields an empty list, not an error.
    pub async fn retrieve(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SimilarityMatch>, StoreError> {
        let mut matches = self.store.top_k(query, k).await?;
        matches.truncate(k);
        debug!(
            k,
            returned = matches.len(),
            best = ?best_similarity(&matches),
            "retrieved similar tests"
        );
        Ok(matches)
    }
}

/// Highest similarity among `matches`, ignoring NaN scores.
pub fn best_similarity(matches: &[SimilarityMatch]) -> Option<f64> {
    matches
        .iter()
        .map(|m| m.similarity)
        .filter(|s| !s.is_nan())
        .max_by(f64::total_cmp)
}
