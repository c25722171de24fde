//! Issue-to-test mapping endpoint.

use axum::Json;
use axum::extract::State;
use testmap_core::mapping::MappingRequest;

use crate::AppState;
use crate::error::AppResult;
use crate::models::MapWorkflowResponse;

/// `POST /api/ast-mapping/map-workflow-to-ast`
pub async fn map_workflow_to_ast(
    State(state): State<AppState>,
    Json(req): Json<MappingRequest>,
) -> AppResult<Json<MapWorkflowResponse>> {
    let outcome = state.engine.decide(&req).await?;
    Ok(Json(outcome.into()))
}
