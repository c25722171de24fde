//! Mapping decision engine: decides whether an issue report is covered by
//! an existing test or needs a new one.
//!
//! Flow per call: validate → embed description → retrieve top-K → threshold
//! gate → resolve. Reuse candidates go through a ranking prompt that picks
//! one test (or none); uncovered issues get a drafted test scenario. The
//! engine never writes to the store and never retries.

pub mod config;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::embedding::Embedder;
use crate::generation::{TextGenerator, non_empty, prompts};
use crate::provider::{ProviderError, with_timeout};
use crate::retrieval::{SimilarityRetriever, best_similarity};
use crate::store::{SimilarityMatch, StoreError, VectorStore};

pub use config::MappingConfig;

/// Mapping failures, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(#[source] ProviderError),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[source] StoreError),

    #[error("Mapping failed: {0}")]
    MappingFailed(#[source] ProviderError),
}

impl MappingError {
    /// Pipeline stage the failure came from.
    pub fn stage(&self) -> &'static str {
        match self {
            MappingError::InvalidRequest(_) => "validate",
            MappingError::EmbeddingUnavailable(_) => "embed",
            MappingError::Retrieval(_) => "retrieve",
            MappingError::MappingFailed(_) => "decide",
        }
    }
}

/// An issue report to map. Missing fields deserialize as blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingRequest {
    /// Category tag, e.g. `BUG` or `FR`.
    #[serde(rename = "type")]
    pub issue_type: String,
    pub title: String,
    pub description: String,
}

impl MappingRequest {
    pub fn new(
        issue_type: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            issue_type: issue_type.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// All three fields must be non-blank.
    pub fn validate(&self) -> Result<(), MappingError> {
        let missing: Vec<&str> = [
            ("type", &self.issue_type),
            ("title", &self.title),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MappingError::InvalidRequest(format!(
                "type, title and description are all required (missing: {})",
                missing.join(", ")
            )))
        }
    }
}

/// Outcome of a mapping call. Exactly one branch is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingDecision {
    /// Similar tests exist; the ranking pass chose among them.
    Reuse {
        /// Candidate named by the ranking reply, if it named one.
        selected: Option<SimilarityMatch>,
        /// Full ranking reply.
        justification: String,
    },
    /// Nothing is similar enough; a scenario for a new test was drafted.
    NewTest { scenario: String },
}

impl MappingDecision {
    pub fn requires_new_test(&self) -> bool {
        matches!(self, MappingDecision::NewTest { .. })
    }

    pub fn mapping_decision(&self) -> Option<&str> {
        match self {
            MappingDecision::Reuse { justification, .. } => Some(justification),
            MappingDecision::NewTest { .. } => None,
        }
    }

    pub fn new_test_scenario(&self) -> Option<&str> {
        match self {
            MappingDecision::NewTest { scenario } => Some(scenario),
            MappingDecision::Reuse { .. } => None,
        }
    }

    pub fn selected(&self) -> Option<&SimilarityMatch> {
        match self {
            MappingDecision::Reuse { selected, .. } => selected.as_ref(),
            MappingDecision::NewTest { .. } => None,
        }
    }
}

/// Wall-clock milliseconds spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    pub embed_ms: u64,
    pub retrieve_ms: u64,
    pub resolve_ms: u64,
    pub total_ms: u64,
}

/// Decision plus the evidence it was based on.
#[derive(Debug, Clone)]
pub struct MappingOutcome {
    pub matches: Vec<SimilarityMatch>,
    pub decision: MappingDecision,
    pub timings: StageTimings,
}

/// Whether the best match falls short of `threshold`.
///
/// No matches (or only NaN scores) always requires a new test; a best score
/// equal to the threshold does not.
pub fn requires_new_test(matches: &[SimilarityMatch], threshold: f64) -> bool {
    match best_similarity(matches) {
        Some(best) => best < threshold,
        None => true,
    }
}

/// Stateless mapping engine; safe to share across concurrent requests.
pub struct MappingEngine {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    retriever: SimilarityRetriever,
    config: MappingConfig,
}

impl MappingEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn VectorStore>,
        config: MappingConfig,
    ) -> Self {
        Self {
            embedder,
            generator,
            retriever: SimilarityRetriever::new(store),
            config,
        }
    }

    /// Map one issue report.
    pub async fn decide(&self, request: &MappingRequest) -> Result<MappingOutcome, MappingError> {
        request.validate()?;
        let started = Instant::now();

        let embedding = with_timeout(
            self.config.provider_timeout,
            self.embedder.embed(&request.description),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, provider = self.embedder.name(), "embedding failed");
            MappingError::EmbeddingUnavailable(e)
        })?;
        let embedded_at = Instant::now();

        let matches = self
            .retriever
            .retrieve(&embedding, self.config.top_k)
            .await
            .map_err(MappingError::Retrieval)?;
        let retrieved_at = Instant::now();

        let new_test = requires_new_test(&matches, self.config.similarity_threshold);
        let resolved = if new_test {
            self.draft_new_test(request).await
        } else {
            self.rank(request, &matches).await
        };
        let decision = resolved.map_err(|e| {
            warn!(error = %e, provider = self.generator.name(), "mapping resolution failed");
            MappingError::MappingFailed(e)
        })?;
        let finished = Instant::now();

        let timings = StageTimings {
            embed_ms: millis(embedded_at - started),
            retrieve_ms: millis(retrieved_at - embedded_at),
            resolve_ms: millis(finished - retrieved_at),
            total_ms: millis(finished - started),
        };

        info!(
            issue_type = %request.issue_type,
            candidates = matches.len(),
            best = ?best_similarity(&matches),
            threshold = self.config.similarity_threshold,
            requires_new_test = new_test,
            selected = ?decision.selected().map(|m| &m.test_name),
            total_ms = timings.total_ms,
            "mapping decided"
        );

        Ok(MappingOutcome {
            matches,
            decision,
            timings,
        })
    }

    async fn draft_new_test(
        &self,
        request: &MappingRequest,
    ) -> Result<MappingDecision, ProviderError> {
        let prompt = prompts::new_test_for_issue(
            &request.issue_type,
            &request.title,
            &request.description,
        );
        let scenario = self.generate(&prompt).await?;
        Ok(MappingDecision::NewTest { scenario })
    }

    async fn rank(
        &self,
        request: &MappingRequest,
        matches: &[SimilarityMatch],
    ) -> Result<MappingDecision, ProviderError> {
        let prompt = prompts::rank_candidates(
            &request.issue_type,
            &request.title,
            &request.description,
            matches,
        );
        let justification = self.generate(&prompt).await?;
        let selected = prompts::parse_choice(&justification, matches.len())
            .and_then(|i| matches.get(i).cloned());
        Ok(MappingDecision::Reuse {
            selected,
            justification,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let text = with_timeout(self.config.provider_timeout, self.generator.generate(prompt))
            .await?;
        non_empty(Some(text))
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
