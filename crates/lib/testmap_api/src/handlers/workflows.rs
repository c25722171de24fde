//! New-test workflow endpoint.

use axum::Json;
use axum::extract::State;
use testmap_core::workflow::{NewTestRequest, WorkflowTask};

use crate::AppState;
use crate::error::AppResult;

/// `POST /api/ast-workflows/new-ast-workflow`
pub async fn new_workflow(
    State(state): State<AppState>,
    Json(req): Json<NewTestRequest>,
) -> AppResult<Json<WorkflowTask>> {
    Ok(Json(state.workflows.create_workflow(&req).await?))
}
