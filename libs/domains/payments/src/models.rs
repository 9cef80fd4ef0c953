use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Largest accepted gap between the declared amount and the order total.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// Payment entity - one proof-of-payment per order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Paid order; unique across payments
    pub order_id: Uuid,
    /// Buyer who declared the payment
    pub client_id: Uuid,
    /// Declared amount, must match the order total within [`AMOUNT_TOLERANCE`]
    pub amount: f64,
    /// Stored proof file name, set once the upload lands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(order_id: Uuid, client_id: Uuid, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            order_id,
            client_id,
            amount,
            proof_file: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `amount` settles an order of total `expected`.
    pub fn amount_matches(amount: f64, expected: f64) -> bool {
        (amount - expected).abs() <= AMOUNT_TOLERANCE
    }
}

/// DTO for declaring a payment
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePayment {
    pub order_id: Uuid,
    #[validate(range(min = 0.0))]
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_matching_allows_one_cent_drift() {
        assert!(Payment::amount_matches(1000.0, 1000.0));
        assert!(Payment::amount_matches(1000.01, 1000.0));
        assert!(Payment::amount_matches(999.99, 1000.0));
        assert!(!Payment::amount_matches(1000.02, 1000.0));
        assert!(!Payment::amount_matches(999.0, 1000.0));
    }

    #[test]
    fn new_payment_has_no_proof_yet() {
        let payment = Payment::new(Uuid::new_v4(), Uuid::new_v4(), 150.0);
        assert!(payment.proof_file.is_none());
    }
}
