//! Account activation seam.
//!
//! Granting a subscription re-activates the owning account, but the account
//! store lives in another domain that already depends on this one. The
//! service therefore talks to an injected [`AccountActivator`]; the API app
//! wires in an implementation backed by the user repository.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SubscriptionResult;

#[async_trait]
pub trait AccountActivator: Send + Sync {
    async fn activate(&self, user_id: Uuid) -> SubscriptionResult<()>;
}

/// No-op activator for tests and contexts without an account store.
#[derive(Debug, Clone, Default)]
pub struct NullActivator;

#[async_trait]
impl AccountActivator for NullActivator {
    async fn activate(&self, _user_id: Uuid) -> SubscriptionResult<()> {
        Ok(())
    }
}
