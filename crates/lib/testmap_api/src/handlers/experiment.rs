//! Batch mapping experiment endpoint.

use axum::Json;
use axum::extract::State;
use testmap_core::experiment::{ExperimentResult, load_items, run_experiment};

use crate::AppState;
use crate::error::AppResult;

/// `GET /api/experiment/run-json`: map every item of the experiment file.
pub async fn run_json(State(state): State<AppState>) -> AppResult<Json<Vec<ExperimentResult>>> {
    let items = load_items(&state.config.experiment_file).await?;
    Ok(Json(run_experiment(&state.engine, &items).await))
}
