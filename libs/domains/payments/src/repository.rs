use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PaymentError, PaymentResult};
use crate::models::Payment;

/// Repository trait for payment persistence operations
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment. Fails with [`PaymentError::DuplicateOrder`] when the
    /// order already has one.
    async fn insert(&self, payment: Payment) -> PaymentResult<Payment>;
    async fn get_by_id(&self, id: Uuid) -> PaymentResult<Option<Payment>>;
    async fn list_for_client(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> PaymentResult<Vec<Payment>>;
    async fn list_all(&self, limit: i64, offset: u64) -> PaymentResult<Vec<Payment>>;
    /// Record the stored proof file name. Returns None when the payment does
    /// not exist.
    async fn set_proof(&self, id: Uuid, file_name: &str) -> PaymentResult<Option<Payment>>;
}

/// In-memory implementation of PaymentRepository for testing
#[derive(Clone, Default)]
pub struct InMemoryPaymentRepository {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut payments: Vec<Payment>, limit: i64, offset: u64) -> Vec<Payment> {
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    payments
        .into_iter()
        .skip(offset as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert(&self, payment: Payment) -> PaymentResult<Payment> {
        let mut payments = self.payments.write().await;
        if payments.values().any(|p| p.order_id == payment.order_id) {
            return Err(PaymentError::DuplicateOrder(payment.order_id));
        }
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_by_id(&self, id: Uuid) -> PaymentResult<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn list_for_client(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> PaymentResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        let matching = payments
            .values()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect();
        Ok(newest_first(matching, limit, offset))
    }

    async fn list_all(&self, limit: i64, offset: u64) -> PaymentResult<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(newest_first(
            payments.values().cloned().collect(),
            limit,
            offset,
        ))
    }

    async fn set_proof(&self, id: Uuid, file_name: &str) -> PaymentResult<Option<Payment>> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&id) {
            Some(payment) => {
                payment.proof_file = Some(file_name.to_string());
                payment.updated_at = chrono::Utc::now();
                Ok(Some(payment.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_payment_for_same_order_is_rejected() {
        let repo = InMemoryPaymentRepository::new();
        let order_id = Uuid::new_v4();

        repo.insert(Payment::new(order_id, Uuid::new_v4(), 100.0))
            .await
            .unwrap();
        let err = repo
            .insert(Payment::new(order_id, Uuid::new_v4(), 100.0))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateOrder(id) if id == order_id));
    }

    #[tokio::test]
    async fn set_proof_updates_existing_payment_only() {
        let repo = InMemoryPaymentRepository::new();
        let payment = repo
            .insert(Payment::new(Uuid::new_v4(), Uuid::new_v4(), 250.0))
            .await
            .unwrap();

        let updated = repo
            .set_proof(payment.id, "virement_0199.pdf")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.proof_file.as_deref(), Some("virement_0199.pdf"));

        assert!(repo
            .set_proof(Uuid::new_v4(), "autre.pdf")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn client_list_is_scoped() {
        let repo = InMemoryPaymentRepository::new();
        let client = Uuid::new_v4();

        repo.insert(Payment::new(Uuid::new_v4(), client, 10.0))
            .await
            .unwrap();
        repo.insert(Payment::new(Uuid::new_v4(), client, 20.0))
            .await
            .unwrap();
        repo.insert(Payment::new(Uuid::new_v4(), Uuid::new_v4(), 30.0))
            .await
            .unwrap();

        assert_eq!(repo.list_for_client(client, 50, 0).await.unwrap().len(), 2);
        assert_eq!(repo.list_all(50, 0).await.unwrap().len(), 3);
    }
}
