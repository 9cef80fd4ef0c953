//! Business logic for subscription windows

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::activation::AccountActivator;
use crate::error::{SubscriptionError, SubscriptionResult};
use crate::models::{
    CreateSubscription, CurrentSubscription, Subscription, UpdateSubscription,
};
use crate::repository::SubscriptionRepository;

/// Subscription service containing business logic
pub struct SubscriptionService<R: SubscriptionRepository> {
    repository: Arc<R>,
    activator: Arc<dyn AccountActivator>,
}

impl<R: SubscriptionRepository> SubscriptionService<R> {
    pub fn new(repository: Arc<R>, activator: Arc<dyn AccountActivator>) -> Self {
        Self {
            repository,
            activator,
        }
    }

    /// Grant a window and re-activate the owning account. The grant itself
    /// still succeeds if the activation side effect fails.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn grant(&self, input: CreateSubscription) -> SubscriptionResult<Subscription> {
        if input.end_date <= input.start_date {
            return Err(SubscriptionError::Validation(
                "end_date must be after start_date".to_string(),
            ));
        }
        let subscription = Subscription::new(input);
        let subscription = self.repository.insert(subscription).await?;

        if let Err(e) = self.activator.activate(subscription.user_id).await {
            tracing::warn!(
                user_id = %subscription.user_id,
                error = %e,
                "Failed to re-activate account after subscription grant"
            );
        }
        Ok(subscription)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> SubscriptionResult<Subscription> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(SubscriptionError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: u64) -> SubscriptionResult<Vec<Subscription>> {
        self.repository.list(limit, offset).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSubscription,
    ) -> SubscriptionResult<Subscription> {
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end <= start {
                return Err(SubscriptionError::Validation(
                    "end_date must be after start_date".to_string(),
                ));
            }
        }
        self.repository
            .update(id, input)
            .await?
            .ok_or(SubscriptionError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn revoke(&self, id: Uuid) -> SubscriptionResult<()> {
        let deleted = self.repository.delete(id).await?;
        if !deleted {
            return Err(SubscriptionError::NotFound(id));
        }
        Ok(())
    }

    /// The user-facing "my subscription" view with the days left.
    #[instrument(skip(self))]
    pub async fn current_summary_for(&self, user_id: Uuid) -> SubscriptionResult<CurrentSubscription> {
        let subscription = self
            .repository
            .latest_for_user(user_id)
            .await?
            .ok_or(SubscriptionError::NoneForUser(user_id))?;
        Ok(CurrentSubscription::at(subscription, Utc::now()))
    }

}

impl<R: SubscriptionRepository> Clone for SubscriptionService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            activator: Arc::clone(&self.activator),
        }
    }
}
