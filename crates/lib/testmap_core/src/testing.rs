//! Deterministic provider and store substitutes shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::embedding::Embedder;
use crate::generation::TextGenerator;
use crate::provider::ProviderError;
use crate::store::{
    SimilarityMatch, StoreError, TestKey, TestVector, TestVectorInput, UpsertOutcome,
    VectorStore,
};

/// Returns the same vector for every text.
pub struct StubEmbedder {
    default: Vec<f32>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self {
            default: vector,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(dimensions: usize) -> Self {
        Self {
            fail: true,
            ..Self::fixed(vec![0.0; dimensions])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Unavailable("stub embedder down".into()));
        }
        Ok(self.default.clone())
    }

    fn dimensions(&self) -> usize {
        self.default.len()
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Returns canned text and records every prompt it was given.
pub struct StubGenerator {
    reply: String,
    fail_when_prompt_contains: Option<String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_when_prompt_contains: None,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::replying("unused").failing_on("")
    }

    /// Fail only for prompts containing `marker` (every prompt contains "").
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_when_prompt_contains = Some(marker.to_string());
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_when_prompt_contains {
            Some(marker) if prompt.contains(marker.as_str()) => {
                Err(ProviderError::Unavailable("stub generator down".into()))
            }
            _ => Ok(self.reply.clone()),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Store that returns canned matches, or fails every call.
pub struct StubStore {
    dimensions: usize,
    matches: Vec<SimilarityMatch>,
    unavailable: bool,
}

impl StubStore {
    pub fn with_matches(dimensions: usize, matches: Vec<SimilarityMatch>) -> Self {
        Self {
            dimensions,
            matches,
            unavailable: false,
        }
    }

    pub fn unavailable(dimensions: usize) -> Self {
        Self {
            dimensions,
            matches: Vec::new(),
            unavailable: true,
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for StubStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn exists(&self, _key: &TestKey) -> Result<bool, StoreError> {
        self.check()?;
        Ok(false)
    }

    async fn get(&self, _key: &TestKey) -> Result<Option<TestVector>, StoreError> {
        self.check()?;
        Ok(None)
    }

    async fn upsert(&self, _input: &TestVectorInput) -> Result<UpsertOutcome, StoreError> {
        self.check()?;
        Ok(UpsertOutcome::Inserted)
    }

    async fn top_k(&self, _query: &[f32], k: usize) -> Result<Vec<SimilarityMatch>, StoreError> {
        self.check()?;
        Ok(self.matches.iter().take(k).cloned().collect())
    }
}

/// A candidate in `LoginModule/ITPRegister` with the given similarity.
pub fn candidate(test_name: &str, similarity: f64) -> SimilarityMatch {
    SimilarityMatch {
        module: "LoginModule".to_string(),
        app: "ITPRegister".to_string(),
        test_name: test_name.to_string(),
        similarity,
    }
}
