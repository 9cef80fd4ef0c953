use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type NotificationResult<T> = Result<T, NotificationError>;

/// Convert NotificationError to AppError for standardized error responses
impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound(id) => {
                AppError::NotFound(format!("Notification {} not found", id))
            }
            NotificationError::Database(msg) => AppError::InternalServerError(msg),
            NotificationError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for NotificationError {
    fn from(err: mongodb::error::Error) -> Self {
        NotificationError::Database(err.to_string())
    }
}
