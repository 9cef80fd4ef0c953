use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("Problem not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProblemResult<T> = Result<T, ProblemError>;

impl From<ProblemError> for AppError {
    fn from(err: ProblemError) -> Self {
        match err {
            ProblemError::NotFound(id) => AppError::NotFound(format!("Problem {} not found", id)),
            ProblemError::Validation(msg) => AppError::BadRequest(msg),
            ProblemError::Database(msg) => AppError::InternalServerError(msg),
            ProblemError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProblemError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProblemError {
    fn from(err: mongodb::error::Error) -> Self {
        ProblemError::Database(err.to_string())
    }
}
