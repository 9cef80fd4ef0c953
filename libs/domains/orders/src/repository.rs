use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::OrderResult;
use crate::models::{Order, OrderStatus};

/// Repository trait for order persistence operations
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: Order) -> OrderResult<Order>;
    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<Order>>;
    async fn list_for_client(&self, client_id: Uuid, limit: i64, offset: u64)
        -> OrderResult<Vec<Order>>;
    async fn list_for_supplier(
        &self,
        supplier_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> OrderResult<Vec<Order>>;
    async fn list_all(&self, limit: i64, offset: u64) -> OrderResult<Vec<Order>>;

    /// Compare-and-set status change. Returns `None` when the order is
    /// missing or no longer in `from`, so a concurrent transition can never
    /// be overwritten with a stale one.
    async fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> OrderResult<Option<Order>>;
}

/// In-memory implementation of OrderRepository for testing
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut orders: Vec<Order>, limit: i64, offset: u64) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
        .into_iter()
        .skip(offset as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: Order) -> OrderResult<Order> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn list_for_client(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> OrderResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let matching = orders
            .values()
            .filter(|o| o.client_id == client_id)
            .cloned()
            .collect();
        Ok(newest_first(matching, limit, offset))
    }

    async fn list_for_supplier(
        &self,
        supplier_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> OrderResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let matching = orders
            .values()
            .filter(|o| o.supplier_id == supplier_id)
            .cloned()
            .collect();
        Ok(newest_first(matching, limit, offset))
    }

    async fn list_all(&self, limit: i64, offset: u64) -> OrderResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(orders.values().cloned().collect(), limit, offset))
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> OrderResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                order.updated_at = chrono::Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderLine;

    fn sample_order(client_id: Uuid, supplier_id: Uuid) -> Order {
        Order::new(
            client_id,
            "Labo Curie".to_string(),
            supplier_id,
            vec![OrderLine {
                product_id: Uuid::new_v4(),
                product_name: "Bec Bunsen".to_string(),
                unit_price: 45.0,
                quantity: 3,
            }],
        )
    }

    #[tokio::test]
    async fn lists_are_scoped_by_party() {
        let repo = InMemoryOrderRepository::new();
        let client = Uuid::new_v4();
        let supplier = Uuid::new_v4();

        repo.insert(sample_order(client, supplier)).await.unwrap();
        repo.insert(sample_order(Uuid::new_v4(), supplier)).await.unwrap();
        repo.insert(sample_order(client, Uuid::new_v4())).await.unwrap();

        assert_eq!(repo.list_for_client(client, 50, 0).await.unwrap().len(), 2);
        assert_eq!(
            repo.list_for_supplier(supplier, 50, 0).await.unwrap().len(),
            2
        );
        assert_eq!(repo.list_all(50, 0).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_status_touches_updated_at() {
        let repo = InMemoryOrderRepository::new();
        let order = repo
            .insert(sample_order(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();

        let updated = repo
            .update_status(order.id, OrderStatus::EnCours, OrderStatus::OnRoute)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::OnRoute);
        assert!(updated.updated_at >= order.updated_at);
    }

    #[tokio::test]
    async fn update_status_refuses_a_stale_expectation() {
        let repo = InMemoryOrderRepository::new();
        let order = repo
            .insert(sample_order(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();

        // First writer wins
        repo.update_status(order.id, OrderStatus::EnCours, OrderStatus::OnRoute)
            .await
            .unwrap()
            .unwrap();
        repo.update_status(order.id, OrderStatus::OnRoute, OrderStatus::Arrived)
            .await
            .unwrap()
            .unwrap();

        // A writer that still believes the order is "en cours" must not
        // drag it backwards
        let stale = repo
            .update_status(order.id, OrderStatus::EnCours, OrderStatus::OnRoute)
            .await
            .unwrap();
        assert!(stale.is_none());

        let current = repo.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Arrived);
    }
}
