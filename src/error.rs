//! Unified error types for the users service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::metrics;

/// Process-level errors raised while starting or running the service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store error outside of a request.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Prometheus recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to the store.
///
/// Displays as the raw underlying message so it can be returned to clients
/// unchanged.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Driver, pool or query error.
    #[error("{}", database_message(.0))]
    Database(#[from] sqlx::Error),

    /// Store cannot be reached.
    #[error("{0}")]
    Unavailable(String),
}

/// Server-reported errors carry only the server's own message.
fn database_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// Request-level errors, translated into an HTTP status and `{error}` body.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request is missing required data or is malformed.
    #[error("{0}")]
    Validation(String),

    /// Requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Store failure while serving the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body for every error response on `/api`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(ref e) = self {
            error!(error = %e, "store request failed");
            metrics::inc_store_errors();
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
