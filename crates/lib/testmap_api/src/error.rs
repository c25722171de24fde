//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use testmap_core::experiment::ExperimentError;
use testmap_core::indexing::IndexError;
use testmap_core::mapping::MappingError;
use testmap_core::provider::ProviderError;
use testmap_core::store::StoreError;
use testmap_core::workflow::WorkflowError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider timeout: {0}")]
    ProviderTimeout(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::ProviderUnavailable(m) => {
                (StatusCode::BAD_GATEWAY, "provider_unavailable", m.as_str())
            }
            AppError::ProviderTimeout(m) => {
                (StatusCode::GATEWAY_TIMEOUT, "provider_timeout", m.as_str())
            }
            AppError::StoreUnavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", m.as_str())
            }
            AppError::Internal(m) => {
                error!("internal error: {m}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout(_) => AppError::ProviderTimeout(e.to_string()),
            ProviderError::Config(_) | ProviderError::UnsupportedProvider(_) => {
                AppError::Internal(e.to_string())
            }
            _ => AppError::ProviderUnavailable(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => AppError::StoreUnavailable(e.to_string()),
            StoreError::DimensionMismatch { .. } | StoreError::InvalidTopK => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<MappingError> for AppError {
    fn from(e: MappingError) -> Self {
        match e {
            MappingError::InvalidRequest(msg) => AppError::Validation(msg),
            MappingError::EmbeddingUnavailable(e) | MappingError::MappingFailed(e) => e.into(),
            MappingError::Retrieval(e) => e.into(),
        }
    }
}

impl From<IndexError> for AppError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::InvalidTestDirectory(_) => AppError::Validation(e.to_string()),
            IndexError::EmptyCorpus => AppError::NotFound(e.to_string()),
            IndexError::Io(_) => AppError::Internal(e.to_string()),
            IndexError::Describe(e) | IndexError::Embed(e) => e.into(),
            IndexError::Store(e) => e.into(),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::InvalidRequest(msg) => AppError::Validation(msg),
            WorkflowError::Generation(e) => e.into(),
        }
    }
}

impl From<ExperimentError> for AppError {
    fn from(e: ExperimentError) -> Self {
        match e {
            ExperimentError::NotFound(_) => AppError::NotFound(e.to_string()),
            ExperimentError::Parse(_) => AppError::Validation(e.to_string()),
            ExperimentError::Io(_) => AppError::Internal(e.to_string()),
        }
    }
}
