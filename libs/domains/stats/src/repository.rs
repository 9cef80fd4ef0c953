use async_trait::async_trait;

use crate::error::StatsResult;
use crate::models::{StatusCount, TopProduct, TopSupplier, UserCounts};

/// One month's worth of revenue as it comes out of the aggregation, before
/// the service zero-fills the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBucket {
    /// Calendar month, `YYYY-MM`
    pub month: String,
    pub revenue: f64,
}

/// Read-side aggregation queries feeding the admin dashboard
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn total_revenue(&self) -> StatsResult<f64>;
    async fn total_orders(&self) -> StatsResult<u64>;
    async fn order_status_counts(&self) -> StatsResult<Vec<StatusCount>>;
    async fn user_counts(&self) -> StatsResult<UserCounts>;
    async fn top_products(&self, limit: i64) -> StatsResult<Vec<TopProduct>>;
    async fn top_suppliers(&self, limit: i64) -> StatsResult<Vec<TopSupplier>>;
    /// Revenue per month for orders created on or after `since` (`YYYY-MM`
    /// buckets). Months without orders are simply absent.
    async fn monthly_revenue(&self, since: chrono::DateTime<chrono::Utc>)
        -> StatsResult<Vec<MonthlyBucket>>;
}
