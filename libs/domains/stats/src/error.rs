use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Malformed aggregation result: {0}")]
    Malformed(String),
}

pub type StatsResult<T> = Result<T, StatsError>;

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::Database(msg) => AppError::InternalServerError(msg),
            StatsError::Malformed(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for StatsError {
    fn from(err: mongodb::error::Error) -> Self {
        StatsError::Database(err.to_string())
    }
}
