use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::error::StatsResult;
use crate::models::{Dashboard, MonthlyRevenue};
use crate::repository::StatsRepository;

/// How many products and suppliers the dashboard ranks.
const TOP_N: i64 = 5;
/// Length of the monthly revenue timeline.
const TRAILING_MONTHS: u32 = 12;

/// Service layer assembling the admin dashboard
pub struct StatsService<S: StatsRepository> {
    repository: Arc<S>,
}

impl<S: StatsRepository> StatsService<S> {
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    /// Recompute the whole dashboard. Each figure is an independent query;
    /// nothing is cached between calls.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> StatsResult<Dashboard> {
        let now = Utc::now();
        let window = month_window(now, TRAILING_MONTHS);
        let since = first_instant_of(window[0].as_str());

        let total_revenue = self.repository.total_revenue().await?;
        let total_orders = self.repository.total_orders().await?;
        let orders_by_status = self.repository.order_status_counts().await?;
        let users = self.repository.user_counts().await?;
        let top_products = self.repository.top_products(TOP_N).await?;
        let top_suppliers = self.repository.top_suppliers(TOP_N).await?;
        let buckets = self.repository.monthly_revenue(since).await?;

        let by_month: HashMap<&str, f64> = buckets
            .iter()
            .map(|b| (b.month.as_str(), b.revenue))
            .collect();

        let mut monthly_revenue = Vec::with_capacity(window.len());
        let mut previous: Option<f64> = None;
        for month in &window {
            let revenue = by_month.get(month.as_str()).copied().unwrap_or(0.0);
            monthly_revenue.push(MonthlyRevenue {
                month: month.clone(),
                revenue,
                delta: previous.map(|p| revenue - p),
            });
            previous = Some(revenue);
        }

        Ok(Dashboard {
            total_revenue,
            total_orders,
            orders_by_status,
            users,
            top_products,
            top_suppliers,
            monthly_revenue,
        })
    }
}

impl<S: StatsRepository> Clone for StatsService<S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

/// The `count` trailing calendar months ending with `now`'s, oldest first,
/// as `YYYY-MM` labels.
fn month_window(now: DateTime<Utc>, count: u32) -> Vec<String> {
    let mut year = now.year();
    let mut month = now.month();
    let mut window = Vec::with_capacity(count as usize);
    for _ in 0..count {
        window.push(format!("{year:04}-{month:02}"));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    window.reverse();
    window
}

/// Midnight UTC on the first day of a `YYYY-MM` label. The label always
/// comes from [`month_window`], so the fallback is unreachable in practice.
fn first_instant_of(label: &str) -> DateTime<Utc> {
    let year: i32 = label[0..4].parse().unwrap_or(1970);
    let month: u32 = label[5..7].parse().unwrap_or(1);
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StatusCount, TopProduct, TopSupplier, UserCounts};
    use crate::repository::MonthlyBucket;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct FakeStats {
        buckets: Vec<MonthlyBucket>,
    }

    #[async_trait]
    impl StatsRepository for FakeStats {
        async fn total_revenue(&self) -> StatsResult<f64> {
            Ok(12_500.0)
        }

        async fn total_orders(&self) -> StatsResult<u64> {
            Ok(42)
        }

        async fn order_status_counts(&self) -> StatsResult<Vec<StatusCount>> {
            Ok(vec![
                StatusCount {
                    status: "en cours".to_string(),
                    count: 30,
                },
                StatusCount {
                    status: "arrived".to_string(),
                    count: 12,
                },
            ])
        }

        async fn user_counts(&self) -> StatsResult<UserCounts> {
            Ok(UserCounts {
                total: 10,
                activated: 7,
                clients: 6,
                suppliers: 3,
                admins: 1,
            })
        }

        async fn top_products(&self, limit: i64) -> StatsResult<Vec<TopProduct>> {
            Ok(vec![TopProduct {
                product_id: Uuid::new_v4(),
                name: "Centrifugeuse".to_string(),
                quantity: limit,
            }])
        }

        async fn top_suppliers(&self, _limit: i64) -> StatsResult<Vec<TopSupplier>> {
            Ok(vec![TopSupplier {
                supplier_id: Uuid::new_v4(),
                revenue: 9_000.0,
                order_count: 18,
            }])
        }

        async fn monthly_revenue(
            &self,
            _since: DateTime<Utc>,
        ) -> StatsResult<Vec<MonthlyBucket>> {
            Ok(self.buckets.clone())
        }
    }

    #[test]
    fn month_window_spans_a_year_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).single().unwrap();
        let window = month_window(now, 4);
        assert_eq!(window, vec!["2025-11", "2025-12", "2026-01", "2026-02"]);
    }

    #[tokio::test]
    async fn dashboard_zero_fills_and_computes_deltas() {
        let now = Utc::now();
        let current = format!("{:04}-{:02}", now.year(), now.month());

        let service = StatsService::new(Arc::new(FakeStats {
            buckets: vec![MonthlyBucket {
                month: current.clone(),
                revenue: 1_000.0,
            }],
        }));

        let dashboard = service.dashboard().await.unwrap();
        assert_eq!(dashboard.monthly_revenue.len(), 12);

        let last = dashboard.monthly_revenue.last().unwrap();
        assert_eq!(last.month, current);
        assert_eq!(last.revenue, 1_000.0);
        // The month before had no orders, so the delta is the full amount
        assert_eq!(last.delta, Some(1_000.0));

        let first = &dashboard.monthly_revenue[0];
        assert_eq!(first.revenue, 0.0);
        assert!(first.delta.is_none());

        assert_eq!(dashboard.total_revenue, 12_500.0);
        assert_eq!(dashboard.total_orders, 42);
        assert_eq!(dashboard.users.activated, 7);
        assert_eq!(dashboard.orders_by_status[0].status, "en cours");
    }
}
