//! Application error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::chart::ChartError;
use crate::gas::GasError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gas(#[from] GasError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Body could not be read as a JSON object.
    #[error("{0}")]
    BadRequest(String),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Blocking planning task panicked or was cancelled.
    #[error("planning task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Gas(_) | AppError::Chart(_) | AppError::BadRequest(_) => {
                tracing::warn!("Rejected request: {}", self);
                StatusCode::BAD_REQUEST
            }
            AppError::Template(e) => {
                tracing::error!("Template rendering failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Task(e) => {
                tracing::error!("Planning task failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
