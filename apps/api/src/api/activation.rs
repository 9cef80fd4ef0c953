//! Bridges subscription grants back into the account store.

use async_trait::async_trait;
use domain_subscriptions::{AccountActivator, SubscriptionError, SubscriptionResult};
use domain_users::{MongoUserRepository, UserRepository, UserStatus};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// [`AccountActivator`] backed by the user repository: granting a
/// subscription re-activates the owning account.
pub struct RepositoryActivator {
    users: Arc<MongoUserRepository>,
}

impl RepositoryActivator {
    pub fn new(users: Arc<MongoUserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AccountActivator for RepositoryActivator {
    async fn activate(&self, user_id: Uuid) -> SubscriptionResult<()> {
        let updated = self
            .users
            .set_status(user_id, UserStatus::Activated)
            .await
            .map_err(|e| SubscriptionError::Internal(e.to_string()))?;
        if !updated {
            warn!(%user_id, "Subscription granted to a user with no account on record");
        }
        Ok(())
    }
}
