use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_products::ProductError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::OrderStatus;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("All products in an order must belong to the same supplier")]
    MultipleSuppliers,

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: Uuid,
        available: i64,
        requested: i64,
    },

    #[error("Cannot move order from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order belongs to another user")]
    NotOwner,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Convert OrderError to AppError for standardized error responses
impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            OrderError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found", id))
            }
            OrderError::Validation(msg) => AppError::BadRequest(msg),
            OrderError::MultipleSuppliers => AppError::BadRequest(
                "All products in an order must belong to the same supplier".to_string(),
            ),
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
            } => AppError::Conflict(format!(
                "Insufficient stock for product {}: {} available, {} requested",
                product_id, available, requested
            )),
            OrderError::InvalidTransition { from, to } => {
                AppError::Conflict(format!("Cannot move order from '{}' to '{}'", from, to))
            }
            OrderError::NotOwner => {
                AppError::Forbidden("Order belongs to another user".to_string())
            }
            OrderError::Database(msg) => AppError::InternalServerError(msg),
            OrderError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for OrderError {
    fn from(err: mongodb::error::Error) -> Self {
        OrderError::Database(err.to_string())
    }
}

impl From<ProductError> for OrderError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => OrderError::ProductNotFound(id),
            ProductError::InsufficientStock { .. } => {
                // Callers that know the product id build InsufficientStock
                // directly; this arm only covers unexpected paths.
                OrderError::Internal(err.to_string())
            }
            other => OrderError::Internal(other.to_string()),
        }
    }
}
