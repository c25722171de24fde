//! # testmap_api
//!
//! HTTP API library for Testmap.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use testmap_core::indexing::Indexer;
use testmap_core::mapping::MappingEngine;
use testmap_core::workflow::WorkflowBuilder;

use crate::config::ApiConfig;
use crate::handlers::{experiment, health, mapping, vectors, workflows};

/// Route paths served by [`router`].
pub mod routes {
    pub const GET_API_HEALTH: &str = "/api/health";
    pub const POST_MAP_WORKFLOW_TO_AST: &str = "/api/ast-mapping/map-workflow-to-ast";
    pub const POST_UPDATE_AST_VEC_DB: &str = "/api/ast-vectors/update-ast-vec-db";
    pub const POST_TEST_FIRST_FILE: &str = "/api/ast-vectors/test-first-file";
    pub const POST_NEW_AST_WORKFLOW: &str = "/api/ast-workflows/new-ast-workflow";
    pub const GET_EXPERIMENT_RUN_JSON: &str = "/api/experiment/run-json";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool; `None` when running on the in-memory store.
    pub pool: Option<PgPool>,
    /// API configuration.
    pub config: ApiConfig,
    pub engine: Arc<MappingEngine>,
    pub indexer: Arc<Indexer>,
    pub workflows: Arc<WorkflowBuilder>,
}

/// Run embedded database migrations.
///
/// Delegates to `testmap_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    testmap_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::GET_API_HEALTH, get(health::health))
        .route(
            routes::POST_MAP_WORKFLOW_TO_AST,
            post(mapping::map_workflow_to_ast),
        )
        .route(routes::POST_UPDATE_AST_VEC_DB, post(vectors::update_vector_db))
        .route(routes::POST_TEST_FIRST_FILE, post(vectors::test_first_file))
        .route(routes::POST_NEW_AST_WORKFLOW, post(workflows::new_workflow))
        .route(routes::GET_EXPERIMENT_RUN_JSON, get(experiment::run_json))
        .layer(cors)
        .with_state(state)
}
