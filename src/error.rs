use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Broad classification callers use to decide how to react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing identifiers or values, detected before any store access
    InvalidArgument,
    /// The referenced movie does not exist
    NotFound,
    /// The data store (or cache) errored or was unreachable
    DependencyFailure,
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dependency failure: {0}")]
    Dependency(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Database(_) | AppError::Cache(_) | AppError::Dependency(_) => {
                ErrorKind::DependencyFailure
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DependencyFailure => {
                tracing::error!(error = %self, "Data store failure");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        let message = match self {
            AppError::NotFound(msg) | AppError::InvalidArgument(msg) => msg,
            // Store internals stay in the logs
            _ => "Data store unavailable".to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
