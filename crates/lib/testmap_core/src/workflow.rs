//! New-test workflow tasks for issues that no existing test covers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::generation::{TextGenerator, non_empty, prompts};
use crate::provider::{ProviderError, with_timeout};
use crate::uuid::uuidv7;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Scenario generation failed: {0}")]
    Generation(#[source] ProviderError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTestRequest {
    pub issue_description: String,
    pub module: String,
    pub app_name: Option<String>,
    /// Best similarity the issue reached against existing tests, 0.0 to 1.0.
    pub similarity_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Less similar issues are more novel and get a higher priority.
    pub fn from_similarity(score: Option<f64>) -> Self {
        match score {
            Some(s) if s < 0.3 => Priority::High,
            Some(s) if s < 0.6 => Priority::Medium,
            Some(s) if s.is_nan() => Priority::Medium,
            Some(_) => Priority::Low,
            None => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTask {
    pub task_id: Uuid,
    pub created_date: DateTime<Utc>,
    pub module: String,
    pub description: String,
    pub test_scenario: String,
    pub priority: Priority,
}

pub struct WorkflowBuilder {
    generator: Arc<dyn TextGenerator>,
    provider_timeout: Duration,
}

impl WorkflowBuilder {
    pub fn new(generator: Arc<dyn TextGenerator>, provider_timeout: Duration) -> Self {
        Self {
            generator,
            provider_timeout,
        }
    }

    pub async fn create_workflow(
        &self,
        request: &NewTestRequest,
    ) -> Result<WorkflowTask, WorkflowError> {
        let issue = request.issue_description.trim();
        let module = request.module.trim();
        if issue.is_empty() || module.is_empty() {
            return Err(WorkflowError::InvalidRequest(
                "issueDescription and module are required".to_string(),
            ));
        }

        let prompt = prompts::new_test_for_module(issue, module, request.app_name.as_deref());
        let test_scenario = with_timeout(self.provider_timeout, self.generator.generate(&prompt))
            .await
            .and_then(|text| non_empty(Some(text)))
            .map_err(WorkflowError::Generation)?;

        let task = WorkflowTask {
            task_id: uuidv7(),
            created_date: Utc::now(),
            module: module.to_string(),
            description: format!("New test required for: {issue}"),
            test_scenario,
            priority: Priority::from_similarity(request.similarity_score),
        };
        info!(task_id = %task.task_id, module, priority = ?task.priority, "workflow created");
        Ok(task)
    }
}
