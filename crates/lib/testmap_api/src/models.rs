//! Request and response bodies that are specific to the HTTP surface.
//!
//! Core types that already serialize as camelCase (`IndexSummary`,
//! `RefreshResult`, `WorkflowTask`, `ExperimentResult`) are returned as-is.

use serde::Serialize;
use testmap_core::mapping::{MappingOutcome, StageTimings};
use testmap_core::store::SimilarityMatch;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub version: String,
    /// `None` when running without a database.
    pub db_connected: Option<bool>,
}

/// Body of `POST /api/ast-mapping/map-workflow-to-ast`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapWorkflowResponse {
    pub matches: Vec<SimilarityMatch>,
    pub requires_new_test: bool,
    pub mapping_decision: Option<String>,
    pub new_test_scenario: Option<String>,
    pub selected_test: Option<SimilarityMatch>,
    /// Per-stage milliseconds, serialized as `{embedMs, retrieveMs, resolveMs, totalMs}`.
    pub latency: StageTimings,
}

impl From<MappingOutcome> for MapWorkflowResponse {
    fn from(outcome: MappingOutcome) -> Self {
        let decision = &outcome.decision;
        Self {
            requires_new_test: decision.requires_new_test(),
            mapping_decision: decision.mapping_decision().map(str::to_string),
            new_test_scenario: decision.new_test_scenario().map(str::to_string),
            selected_test: decision.selected().cloned(),
            latency: outcome.timings,
            matches: outcome.matches,
        }
    }
}
