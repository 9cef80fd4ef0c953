use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Subscription not found: {0}")]
    NotFound(Uuid),

    #[error("No subscription on record for user {0}")]
    NoneForUser(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

/// Convert SubscriptionError to AppError for standardized error responses
impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::NotFound(id) => {
                AppError::NotFound(format!("Subscription {} not found", id))
            }
            SubscriptionError::NoneForUser(user_id) => {
                AppError::NotFound(format!("No subscription on record for user {}", user_id))
            }
            SubscriptionError::Validation(msg) => AppError::BadRequest(msg),
            SubscriptionError::Database(msg) => AppError::InternalServerError(msg),
            SubscriptionError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for SubscriptionError {
    fn from(err: mongodb::error::Error) -> Self {
        SubscriptionError::Database(err.to_string())
    }
}
