//! Test vector store: persisted test descriptions and their embeddings,
//! keyed by `(module, app, test_name)`, with nearest-neighbor ranking.
//!
//! - [`postgres::PgVectorStore`]: PostgreSQL + pgvector (`<=>` cosine distance)
//! - [`memory::InMemoryVectorStore`]: exact cosine scan for tests and offline runs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("top_k must be at least 1")]
    InvalidTopK,
}

/// Identity of a test record. At most one record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestKey {
    pub module: String,
    pub app: String,
    pub test_name: String,
}

impl TestKey {
    pub fn new(
        module: impl Into<String>,
        app: impl Into<String>,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            app: app.into(),
            test_name: test_name.into(),
        }
    }
}

impl std::fmt::Display for TestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.module, self.app, self.test_name)
    }
}

/// A stored test record.
#[derive(Debug, Clone, PartialEq)]
pub struct TestVector {
    pub id: Uuid,
    pub key: TestKey,
    /// Locates the test source relative to the test directory.
    pub relative_path: String,
    pub description: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values written by [`VectorStore::upsert`].
#[derive(Debug, Clone)]
pub struct TestVectorInput {
    pub key: TestKey,
    pub relative_path: String,
    pub description: String,
    pub embedding: Vec<f32>,
}

/// Whether an upsert created a record or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A ranked neighbor of a query vector. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityMatch {
    pub module: String,
    pub app: String,
    pub test_name: String,
    /// `1 - cosine distance`.
    pub similarity: f64,
}

impl SimilarityMatch {
    pub fn key(&self) -> TestKey {
        TestKey::new(&self.module, &self.app, &self.test_name)
    }
}

/// Vector-capable key-value store for test descriptions.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Fixed embedding dimension accepted by this store.
    fn dimensions(&self) -> usize;

    async fn exists(&self, key: &TestKey) -> Result<bool, StoreError>;

    async fn get(&self, key: &TestKey) -> Result<Option<TestVector>, StoreError>;

    /// Insert or refresh a record atomically with respect to the key.
    ///
    /// A concurrent insert of the same key resolves to an update; it is never
    /// reported as an error.
    async fn upsert(&self, input: &TestVectorInput) -> Result<UpsertOutcome, StoreError>;

    /// The `k` stored vectors closest to `query`, by ascending cosine
    /// distance (descending similarity), ties broken by key.
    ///
    /// Backends with an approximate index may return a near-best set; the
    /// order within the returned set is still exact.
    async fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<SimilarityMatch>, StoreError>;
}

/// Reject vectors of the wrong dimension.
pub(crate) fn check_dimensions(expected: usize, actual: usize) -> Result<(), StoreError> {
    if expected != actual {
        return Err(StoreError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Order matches by descending similarity, then ascending key.
pub(crate) fn sort_matches(matches: &mut [SimilarityMatch]) {
    matches.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.module.cmp(&b.module))
            .then_with(|| a.app.cmp(&b.app))
            .then_with(|| a.test_name.cmp(&b.test_name))
    });
}
