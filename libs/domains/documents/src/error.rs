use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document bundle not found: {0}")]
    NotFound(Uuid),

    #[error("User {0} has already submitted their paperwork")]
    AlreadySubmitted(Uuid),

    #[error("Expected {expected} document(s), received {received}")]
    WrongDocumentCount { expected: usize, received: usize },

    #[error("No paperwork on record for user {0}")]
    NoBundle(Uuid),

    #[error("Admins do not submit paperwork")]
    RoleNotEligible,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(id) => {
                AppError::NotFound(format!("Document bundle {} not found", id))
            }
            DocumentError::AlreadySubmitted(user_id) => AppError::Conflict(format!(
                "User {} has already submitted their paperwork",
                user_id
            )),
            DocumentError::WrongDocumentCount { expected, received } => AppError::BadRequest(
                format!("Expected {expected} document(s), received {received}"),
            ),
            DocumentError::NoBundle(user_id) => {
                AppError::NotFound(format!("No paperwork on record for user {}", user_id))
            }
            DocumentError::RoleNotEligible => {
                AppError::Forbidden("Admins do not submit paperwork".to_string())
            }
            DocumentError::Validation(msg) => AppError::BadRequest(msg),
            DocumentError::Database(msg) => AppError::InternalServerError(msg),
            DocumentError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for DocumentError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for DocumentError {
    fn from(err: mongodb::error::Error) -> Self {
        DocumentError::Database(err.to_string())
    }
}

impl From<domain_users::error::UserError> for DocumentError {
    fn from(err: domain_users::error::UserError) -> Self {
        DocumentError::Internal(err.to_string())
    }
}
