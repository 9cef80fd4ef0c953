use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Delivery status of an order. Transitions move strictly one step forward;
/// `Arrived` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum OrderStatus {
    #[serde(rename = "en cours")]
    #[strum(serialize = "en cours")]
    EnCours,
    #[serde(rename = "on route")]
    #[strum(serialize = "on route")]
    OnRoute,
    #[serde(rename = "arrived")]
    #[strum(serialize = "arrived")]
    Arrived,
}

impl OrderStatus {
    /// The only status this one may advance to, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::EnCours => Some(OrderStatus::OnRoute),
            OrderStatus::OnRoute => Some(OrderStatus::Arrived),
            OrderStatus::Arrived => None,
        }
    }

    /// Message recorded for the buyer when the order reaches this status.
    pub fn buyer_message(&self, order_id: Uuid) -> String {
        match self {
            OrderStatus::EnCours => format!("Votre commande {} est en cours", order_id),
            OrderStatus::OnRoute => format!("Votre commande {} est en route", order_id),
            OrderStatus::Arrived => format!("Votre commande {} est arrivée", order_id),
        }
    }
}

/// One purchased product, with name and price snapshotted at order time so
/// later catalog edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    /// Selling price per unit at order time
    pub unit_price: f64,
    pub quantity: i64,
}

impl OrderLine {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Order entity - a client purchase addressed to a single supplier
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Buying client
    pub client_id: Uuid,
    /// Client name snapshot, shown to the supplier
    pub client_name: String,
    /// Supplier every line belongs to
    pub supplier_id: Uuid,
    pub lines: Vec<OrderLine>,
    /// Sum of line subtotals
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(client_id: Uuid, client_name: String, supplier_id: Uuid, lines: Vec<OrderLine>) -> Self {
        let now = Utc::now();
        let total = lines.iter().map(OrderLine::subtotal).sum();
        Self {
            id: Uuid::now_v7(),
            client_id,
            client_name,
            supplier_id,
            lines,
            total,
            status: OrderStatus::EnCours,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }
}

/// One requested line in a new order.
///
/// `Serialize` is required by the length rule on `CreateOrder::lines`, which
/// echoes the offending value back in the validation error params.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderLine {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// DTO for creating a new order
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrder {
    #[validate(length(min = 1), nested)]
    pub lines: Vec<CreateOrderLine>,
}

/// DTO for advancing an order's delivery status
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_machine_moves_one_step_forward_only() {
        assert_eq!(OrderStatus::EnCours.next(), Some(OrderStatus::OnRoute));
        assert_eq!(OrderStatus::OnRoute.next(), Some(OrderStatus::Arrived));
        assert_eq!(OrderStatus::Arrived.next(), None);
    }

    #[test]
    fn status_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::EnCours).unwrap(),
            "\"en cours\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::OnRoute).unwrap(),
            "\"on route\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Arrived).unwrap(),
            "\"arrived\""
        );
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let order = Order::new(
            Uuid::new_v4(),
            "Labo Pasteur".to_string(),
            Uuid::new_v4(),
            vec![
                OrderLine {
                    product_id: Uuid::new_v4(),
                    product_name: "Microscope".to_string(),
                    unit_price: 500.0,
                    quantity: 2,
                },
                OrderLine {
                    product_id: Uuid::new_v4(),
                    product_name: "Lamelles".to_string(),
                    unit_price: 12.5,
                    quantity: 4,
                },
            ],
        );

        assert_eq!(order.total, 1050.0);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.status, OrderStatus::EnCours);
    }

    #[test]
    fn create_order_requires_at_least_one_valid_line() {
        let empty = CreateOrder { lines: vec![] };
        assert!(empty.validate().is_err());

        let zero_quantity = CreateOrder {
            lines: vec![CreateOrderLine {
                product_id: Uuid::new_v4(),
                quantity: 0,
            }],
        };
        assert!(zero_quantity.validate().is_err());

        let valid = CreateOrder {
            lines: vec![CreateOrderLine {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
        };
        assert!(valid.validate().is_ok());
    }
}
