use axum::response::{IntoResponse, Response};
use axum_helpers::errors::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Payment domain errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Order {0} already has a payment")]
    DuplicateOrder(Uuid),

    #[error("Declared amount {actual} does not match order total {expected}")]
    AmountMismatch { expected: f64, actual: f64 },

    #[error("Payment does not belong to the caller")]
    NotOwner,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PaymentResult<T> = Result<T, PaymentError>;

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(id) => AppError::NotFound(format!("Payment not found: {id}")),
            PaymentError::OrderNotFound(id) => {
                AppError::NotFound(format!("Order not found: {id}"))
            }
            PaymentError::DuplicateOrder(id) => {
                AppError::Conflict(format!("Order {id} already has a payment"))
            }
            PaymentError::AmountMismatch { expected, actual } => AppError::BadRequest(format!(
                "Declared amount {actual} does not match order total {expected}"
            )),
            PaymentError::NotOwner => {
                AppError::Forbidden("Payment does not belong to the caller".to_string())
            }
            PaymentError::Validation(msg) => AppError::BadRequest(msg),
            PaymentError::Database(msg) => AppError::InternalServerError(msg),
            PaymentError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl From<mongodb::error::Error> for PaymentError {
    fn from(err: mongodb::error::Error) -> Self {
        PaymentError::Database(err.to_string())
    }
}

impl From<domain_orders::error::OrderError> for PaymentError {
    fn from(err: domain_orders::error::OrderError) -> Self {
        use domain_orders::error::OrderError;
        match err {
            OrderError::NotFound(id) => PaymentError::OrderNotFound(id),
            OrderError::Database(msg) => PaymentError::Database(msg),
            other => PaymentError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn duplicate_order_maps_to_conflict() {
        let err = PaymentError::DuplicateOrder(Uuid::new_v4());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn amount_mismatch_maps_to_bad_request() {
        let err = PaymentError::AmountMismatch {
            expected: 1000.0,
            actual: 900.0,
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
