//! Batch mapping experiment over a JSON list of issue reports.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::mapping::{MappingEngine, MappingRequest};
use crate::store::SimilarityMatch;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("Experiment file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid experiment file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One issue report from the experiment file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperimentItem {
    pub no: i64,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub product: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResult {
    pub no: i64,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub product: String,
    pub title: String,
    pub description: String,
    pub requires_new_test: bool,
    pub matches: Vec<SimilarityMatch>,
    pub mapping_decision: Option<String>,
    pub new_test_scenario: Option<String>,
}

/// Read a JSON array of [`ExperimentItem`]s.
pub async fn load_items(path: &Path) -> Result<Vec<ExperimentItem>, ExperimentError> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExperimentError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&json)?)
}

/// Map every item with a description, in order.
///
/// Items whose mapping fails are logged and left out of the results.
pub async fn run_experiment(
    engine: &MappingEngine,
    items: &[ExperimentItem],
) -> Vec<ExperimentResult> {
    let mut results = Vec::with_capacity(items.len());

    for item in items {
        if item.description.trim().is_empty() {
            continue;
        }
        let request = MappingRequest::new(&item.issue_type, &item.title, &item.description);
        match engine.decide(&request).await {
            Ok(outcome) => results.push(ExperimentResult {
                no: item.no,
                issue_type: item.issue_type.clone(),
                product: item.product.clone(),
                title: item.title.clone(),
                description: item.description.clone(),
                requires_new_test: outcome.decision.requires_new_test(),
                mapping_decision: outcome.decision.mapping_decision().map(str::to_string),
                new_test_scenario: outcome.decision.new_test_scenario().map(str::to_string),
                matches: outcome.matches,
            }),
            Err(e) => error!(no = item.no, stage = e.stage(), error = %e, "experiment item failed"),
        }
    }

    info!(
        items = items.len(),
        mapped = results.len(),
        "experiment complete"
    );
    results
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mapping::MappingConfig;
    use crate::testing::{StubEmbedder, StubGenerator, StubStore, candidate};

    fn item(no: i64, title: &str, description: &str) -> ExperimentItem {
        ExperimentItem {
            no,
            issue_type: "BUG".into(),
            product: "ITPRegister".into(),
            title: title.into(),
            description: description.into(),
        }
    }

    #[tokio::test]
    async fn skips_blank_and_omits_failures() {
        let engine = MappingEngine::new(
            Arc::new(StubEmbedder::fixed(vec![1.0, 0.0])),
            Arc::new(StubGenerator::replying("1 - covers it")),
            Arc::new(StubStore::with_matches(2, vec![candidate("GridTest", 0.9)])),
            MappingConfig::default(),
        );
        let items = vec![
            item(1, "Save fails", "Saving throws"),
            item(2, "Blank", "   "),
            // Blank title fails validation and is dropped.
            item(3, "", "Grid freezes"),
        ];

        let results = run_experiment(&engine, &items).await;
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.no, 1);
        assert!(!result.requires_new_test);
        assert_eq!(result.mapping_decision.as_deref(), Some("1 - covers it"));
        assert!(result.new_test_scenario.is_none());
        assert_eq!(result.matches[0].test_name, "GridTest");

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["type"], "BUG");
        assert_eq!(json["requiresNewTest"], false);
    }

    #[tokio::test]
    async fn loads_items_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("experiment.json");
        std::fs::write(
            &path,
            r#"[{"no": 7, "type": "FR", "product": "Billing", "title": "Export", "description": "CSV export"},
               {"no": 8, "title": "Partial"}]"#,
        )
        .unwrap();

        let items = load_items(&path).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].issue_type, "FR");
        assert_eq!(items[1].description, "");

        let missing = load_items(&tmp.path().join("missing.json")).await.unwrap_err();
        assert!(matches!(missing, ExperimentError::NotFound(_)));
    }
}
