//! Indexing engine: keeps the vector store populated from the test corpus.
//!
//! Bulk reindexing only adds tests it has never seen; the single-record
//! refresh path always regenerates the description and embedding.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::corpus::{Corpus, TestArtifact};
use crate::embedding::Embedder;
use crate::generation::{TextGenerator, non_empty, prompts};
use crate::provider::{ProviderError, with_timeout};
use crate::store::{StoreError, TestVectorInput, UpsertOutcome, VectorStore};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid test directory: {0:?}")]
    InvalidTestDirectory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No test files found")]
    EmptyCorpus,

    #[error("Describing test failed: {0}")]
    Describe(#[source] ProviderError),

    #[error("Embedding test description failed: {0}")]
    Embed(#[source] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A test that could not be indexed, and why.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexFailure {
    pub relative_path: String,
    pub error: String,
}

/// Result of a bulk reindex.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub total_seen: usize,
    pub newly_added: usize,
    pub failed: Vec<IndexFailure>,
}

/// Result of refreshing a single test record.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub relative_path: String,
    pub already_existed: bool,
    pub description: String,
    pub embedding_dimension: usize,
}

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn VectorStore>,
    provider_timeout: Duration,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn VectorStore>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            provider_timeout,
        }
    }

    /// Add every artifact whose key is not yet stored.
    ///
    /// Existing records are left untouched. A failing artifact is logged and
    /// recorded in the summary; the rest of the batch still runs.
    pub async fn reindex(&self, corpus: &Corpus) -> IndexSummary {
        let mut summary = IndexSummary {
            total_seen: corpus.len(),
            ..IndexSummary::default()
        };

        for artifact in corpus.artifacts() {
            match self.index_if_new(artifact).await {
                Ok(true) => summary.newly_added += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        path = %artifact.relative_path,
                        key = %artifact.key,
                        error = %e,
                        "failed to index test"
                    );
                    summary.failed.push(IndexFailure {
                        relative_path: artifact.relative_path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            module = corpus.module(),
            total_seen = summary.total_seen,
            newly_added = summary.newly_added,
            failed = summary.failed.len(),
            "reindex complete"
        );
        summary
    }

    /// Regenerate and store the description of one artifact.
    pub async fn refresh_one(&self, artifact: &TestArtifact) -> Result<RefreshResult, IndexError> {
        let (input, outcome) = self.describe_and_store(artifact).await?;
        info!(key = %artifact.key, ?outcome, "refreshed test description");
        Ok(RefreshResult {
            relative_path: input.relative_path,
            already_existed: outcome == UpsertOutcome::Updated,
            description: input.description,
            embedding_dimension: input.embedding.len(),
        })
    }

    /// [`Indexer::refresh_one`] applied to the first artifact of `corpus`.
    pub async fn refresh_first(&self, corpus: &Corpus) -> Result<RefreshResult, IndexError> {
        let artifact = corpus.first().ok_or(IndexError::EmptyCorpus)?;
        self.refresh_one(artifact).await
    }

    async fn index_if_new(&self, artifact: &TestArtifact) -> Result<bool, IndexError> {
        if self.store.exists(&artifact.key).await? {
            return Ok(false);
        }
        let (_, outcome) = self.describe_and_store(artifact).await?;
        // A concurrent writer may have inserted the key since the check.
        Ok(outcome == UpsertOutcome::Inserted)
    }

    async fn describe_and_store(
        &self,
        artifact: &TestArtifact,
    ) -> Result<(TestVectorInput, UpsertOutcome), IndexError> {
        let bytes = tokio::fs::read(&artifact.path).await?;
        let source = String::from_utf8_lossy(&bytes);

        let description = with_timeout(
            self.provider_timeout,
            self.generator.generate(&prompts::describe_test(&source)),
        )
        .await
        .and_then(|text| non_empty(Some(text)))
        .map_err(IndexError::Describe)?;

        let embedding = with_timeout(self.provider_timeout, self.embedder.embed(&description))
            .await
            .map_err(IndexError::Embed)?;

        let input = TestVectorInput {
            key: artifact.key.clone(),
            relative_path: artifact.relative_path.clone(),
            description,
            embedding,
        };
        let outcome = self.store.upsert(&input).await?;
        Ok((input, outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::store::TestKey;
    use crate::store::memory::InMemoryVectorStore;
    use crate::testing::{StubEmbedder, StubGenerator, StubStore};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn corpus_dir(files: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let tests = tmp.path().join("LoginModule").join("Tests");
        fs::create_dir_all(&tests).unwrap();
        for (file, content) in files {
            let path = tests.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        (tmp, tests)
    }

    fn indexer(generator: StubGenerator, store: Arc<InMemoryVectorStore>) -> Indexer {
        Indexer::new(
            Arc::new(StubEmbedder::fixed(vec![0.6, 0.8])),
            Arc::new(generator),
            store,
            TIMEOUT,
        )
    }

    #[tokio::test]
    async fn reindex_adds_new_tests_once() {
        let (_tmp, tests) = corpus_dir(&[(
            "ITPRegister/ProbabilitiesTest.cs",
            "public class ProbabilitiesTest { }",
        )]);
        let corpus = Corpus::scan(&tests, "cs").unwrap();
        let store = Arc::new(InMemoryVectorStore::new(2));
        let indexer = indexer(
            StubGenerator::replying("Verifies CRUD in the probabilities grid"),
            store.clone(),
        );

        let first = indexer.reindex(&corpus).await;
        assert_eq!(first.total_seen, 1);
        assert_eq!(first.newly_added, 1);
        assert!(first.failed.is_empty());

        let key = TestKey::new("LoginModule", "ITPRegister", "ProbabilitiesTest");
        let stored = store.get(&key).await.unwrap().expect("stored");
        assert_eq!(stored.relative_path, "ITPRegister/ProbabilitiesTest.cs");
        assert_eq!(stored.description, "Verifies CRUD in the probabilities grid");

        let second = indexer.reindex(&corpus).await;
        assert_eq!(second.total_seen, 1);
        assert_eq!(second.newly_added, 0);
        let unchanged = store.get(&key).await.unwrap().expect("stored");
        assert_eq!(unchanged.updated_at, stored.updated_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn one_failing_test_does_not_stop_the_batch() {
        let (_tmp, tests) = corpus_dir(&[
            ("App/ATest.cs", "class ATest {}"),
            ("App/BrokenTest.cs", "class BrokenTest {}"),
            ("App/CTest.cs", "class CTest {}"),
        ]);
        let corpus = Corpus::scan(&tests, "cs").unwrap();
        let store = Arc::new(InMemoryVectorStore::new(2));
        let indexer = indexer(
            StubGenerator::replying("description").failing_on("BrokenTest"),
            store.clone(),
        );

        let summary = indexer.reindex(&corpus).await;
        assert_eq!(summary.total_seen, 3);
        assert_eq!(summary.newly_added, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].relative_path, "App/BrokenTest.cs");
        assert!(summary.failed[0].error.contains("Describing test failed"));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn store_outage_is_recorded_per_test() {
        let (_tmp, tests) = corpus_dir(&[("App/ATest.cs", "a"), ("App/BTest.cs", "b")]);
        let corpus = Corpus::scan(&tests, "cs").unwrap();
        let indexer = Indexer::new(
            Arc::new(StubEmbedder::fixed(vec![1.0, 0.0])),
            Arc::new(StubGenerator::replying("description")),
            Arc::new(StubStore::unavailable(2)),
            TIMEOUT,
        );

        let summary = indexer.reindex(&corpus).await;
        assert_eq!(summary.newly_added, 0);
        assert_eq!(summary.failed.len(), 2);
    }

    #[tokio::test]
    async fn refresh_overwrites_existing_record() {
        let (_tmp, tests) = corpus_dir(&[("ITPRegister/ProbabilitiesTest.cs", "class P {}")]);
        let corpus = Corpus::scan(&tests, "cs").unwrap();
        let store = Arc::new(InMemoryVectorStore::new(2));

        let created = indexer(StubGenerator::replying("old"), store.clone())
            .refresh_first(&corpus)
            .await
            .unwrap();
        assert!(!created.already_existed);
        assert_eq!(created.embedding_dimension, 2);

        let key = corpus.first().unwrap().key.clone();
        let before = store.get(&key).await.unwrap().unwrap();

        let refreshed = indexer(StubGenerator::replying("new"), store.clone())
            .refresh_first(&corpus)
            .await
            .unwrap();
        assert!(refreshed.already_existed);
        assert_eq!(refreshed.description, "new");
        assert_eq!(refreshed.relative_path, "ITPRegister/ProbabilitiesTest.cs");

        let after = store.get(&key).await.unwrap().unwrap();
        assert_eq!(after.description, "new");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn refresh_first_on_empty_corpus_fails() {
        let store = Arc::new(InMemoryVectorStore::new(2));
        let err = indexer(StubGenerator::replying("x"), store)
            .refresh_first(&Corpus::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::EmptyCorpus));
    }

    #[tokio::test]
    async fn embedding_of_wrong_dimension_is_rejected_by_store() {
        let (_tmp, tests) = corpus_dir(&[("App/ATest.cs", "a")]);
        let corpus = Corpus::scan(&tests, "cs").unwrap();
        let indexer = Indexer::new(
            Arc::new(StubEmbedder::fixed(vec![1.0, 0.0, 0.0])),
            Arc::new(StubGenerator::replying("description")),
            Arc::new(InMemoryVectorStore::new(2)),
            TIMEOUT,
        );

        let err = indexer.refresh_first(&corpus).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::Store(StoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }
}
