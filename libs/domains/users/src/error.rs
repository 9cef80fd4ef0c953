use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not activated")]
    AccountNotActivated,

    #[error("Subscription has expired")]
    SubscriptionExpired,

    #[error("No subscription on record")]
    SubscriptionMissing,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            UserError::DuplicateEmail(email) => {
                AppError::Conflict(format!("User with email '{}' already exists", email))
            }
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::InvalidCredentials => AppError::AccountGate(ErrorCode::InvalidCredentials),
            UserError::AccountNotActivated => {
                AppError::AccountGate(ErrorCode::AccountNotActivated)
            }
            UserError::SubscriptionExpired => {
                AppError::AccountGate(ErrorCode::SubscriptionExpired)
            }
            UserError::SubscriptionMissing => {
                AppError::AccountGate(ErrorCode::SubscriptionMissing)
            }
            UserError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            UserError::PasswordHash(msg) => AppError::InternalServerError(msg),
            UserError::Database(msg) => AppError::InternalServerError(msg),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        UserError::Database(err.to_string())
    }
}
