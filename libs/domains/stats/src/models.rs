use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Order count for one lifecycle status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    /// Wire status name ("en cours", "on route", "arrived")
    pub status: String,
    pub count: u64,
}

/// Account population broken down by role and activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserCounts {
    pub total: u64,
    pub activated: u64,
    pub clients: u64,
    pub suppliers: u64,
    pub admins: u64,
}

/// A product ranked by total ordered quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
}

/// A supplier ranked by total revenue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TopSupplier {
    pub supplier_id: Uuid,
    pub revenue: f64,
    pub order_count: u64,
}

/// Revenue booked in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyRevenue {
    /// Calendar month, `YYYY-MM`
    pub month: String,
    pub revenue: f64,
    /// Difference against the previous month; absent for the oldest bucket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

/// The admin dashboard payload, assembled from independent aggregations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Dashboard {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub orders_by_status: Vec<StatusCount>,
    pub users: UserCounts,
    pub top_products: Vec<TopProduct>,
    pub top_suppliers: Vec<TopSupplier>,
    /// Trailing twelve months, oldest first, empty months zero-filled
    pub monthly_revenue: Vec<MonthlyRevenue>,
}
