//! Vector store maintenance endpoints.

use axum::Json;
use axum::extract::State;
use testmap_core::corpus::Corpus;
use testmap_core::indexing::{IndexError, IndexSummary, RefreshResult};

use crate::AppState;
use crate::error::AppResult;

fn scan(state: &AppState) -> Result<Corpus, IndexError> {
    let dir = state
        .config
        .test_directory
        .as_deref()
        .ok_or_else(|| IndexError::InvalidTestDirectory(String::new()))?;
    Corpus::scan(dir, &state.config.test_file_extension)
}

/// `POST /api/ast-vectors/update-ast-vec-db`: index tests not yet stored.
pub async fn update_vector_db(State(state): State<AppState>) -> AppResult<Json<IndexSummary>> {
    let corpus = scan(&state)?;
    Ok(Json(state.indexer.reindex(&corpus).await))
}

/// `POST /api/ast-vectors/test-first-file`: regenerate the first test's record.
pub async fn test_first_file(State(state): State<AppState>) -> AppResult<Json<RefreshResult>> {
    let corpus = scan(&state)?;
    Ok(Json(state.indexer.refresh_first(&corpus).await?))
}
