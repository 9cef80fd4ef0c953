use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SubscriptionResult;
use crate::models::{Subscription, SubscriptionStatus, UpdateSubscription};

/// Repository trait for subscription persistence operations
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn insert(&self, subscription: Subscription) -> SubscriptionResult<Subscription>;
    async fn get_by_id(&self, id: Uuid) -> SubscriptionResult<Option<Subscription>>;

    /// The user's most recently created subscription, if any.
    async fn latest_for_user(&self, user_id: Uuid) -> SubscriptionResult<Option<Subscription>>;

    async fn list(&self, limit: i64, offset: u64) -> SubscriptionResult<Vec<Subscription>>;
    async fn update(
        &self,
        id: Uuid,
        update: UpdateSubscription,
    ) -> SubscriptionResult<Option<Subscription>>;
    async fn delete(&self, id: Uuid) -> SubscriptionResult<bool>;

    /// Flip a subscription's stored status.
    async fn set_status(&self, id: Uuid, status: SubscriptionStatus) -> SubscriptionResult<bool>;
}

/// In-memory implementation of SubscriptionRepository for testing
#[derive(Clone, Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Arc<RwLock<HashMap<Uuid, Subscription>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert(&self, subscription: Subscription) -> SubscriptionResult<Subscription> {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn get_by_id(&self, id: Uuid) -> SubscriptionResult<Option<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.get(&id).cloned())
    }

    async fn latest_for_user(&self, user_id: Uuid) -> SubscriptionResult<Option<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn list(&self, limit: i64, offset: u64) -> SubscriptionResult<Vec<Subscription>> {
        let subscriptions = self.subscriptions.read().await;
        let mut result: Vec<Subscription> = subscriptions.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result
            .into_iter()
            .skip(offset as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        update: UpdateSubscription,
    ) -> SubscriptionResult<Option<Subscription>> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions.get_mut(&id) {
            Some(subscription) => {
                subscription.apply_update(update);
                Ok(Some(subscription.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> SubscriptionResult<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        Ok(subscriptions.remove(&id).is_some())
    }

    async fn set_status(&self, id: Uuid, status: SubscriptionStatus) -> SubscriptionResult<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions.get_mut(&id) {
            Some(subscription) => {
                subscription.status = status;
                subscription.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
