//! In-memory vector store with exact cosine ranking.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use super::{
    SimilarityMatch, StoreError, TestKey, TestVector, TestVectorInput, UpsertOutcome,
    VectorStore, check_dimensions,
};
use crate::uuid::uuidv7;

/// Cosine distance in `[0, 2]`. A zero-magnitude vector is treated as
/// orthogonal to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Vector store held in process memory. Records are lost on drop.
#[derive(Debug)]
pub struct InMemoryVectorStore {
    dimensions: usize,
    records: RwLock<BTreeMap<TestKey, TestVector>>,
}

impl InMemoryVectorStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn exists(&self, key: &TestKey) -> Result<bool, StoreError> {
        Ok(self.records.read().await.contains_key(key))
    }

    async fn get(&self, key: &TestKey) -> Result<Option<TestVector>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn upsert(&self, input: &TestVectorInput) -> Result<UpsertOutcome, StoreError> {
        check_dimensions(self.dimensions, input.embedding.len())?;

        // Check and write under one lock.
        let mut records = self.records.write().await;
        let now = Utc::now();

        match records.get_mut(&input.key) {
            Some(existing) => {
                existing.relative_path = input.relative_path.clone();
                existing.description = input.description.clone();
                existing.embedding = input.embedding.clone();
                // updated_at must strictly advance even when the clock has not.
                existing.updated_at = now.max(existing.updated_at + Duration::microseconds(1));
                Ok(UpsertOutcome::Updated)
            }
            None => {
                records.insert(
                    input.key.clone(),
                    TestVector {
                        id: uuidv7(),
                        key: input.key.clone(),
                        relative_path: input.relative_path.clone(),
                        description: input.description.clone(),
                        embedding: input.embedding.clone(),
                        created_at: now,
                        updated_at: now,
                    },
                );
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<SimilarityMatch>, StoreError> {
        check_dimensions(self.dimensions, query.len())?;
        if k == 0 {
            return Err(StoreError::InvalidTopK);
        }

        let records = self.records.read().await;
        // BTreeMap iteration is key-ordered and the sort is stable, so equal
        // distances keep key order.
        let mut ranked: Vec<(f64, &TestVector)> = records
            .values()
            .map(|r| (cosine_distance(query, &r.embedding), r))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(distance, r)| SimilarityMatch {
                module: r.key.module.clone(),
                app: r.key.app.clone(),
                test_name: r.key.test_name.clone(),
                similarity: 1.0 - distance,
            })
            .collect())
    }
}
