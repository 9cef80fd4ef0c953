use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::NotificationResult;
use crate::models::Notification;

/// Repository trait for notification persistence operations
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> NotificationResult<Notification>;

    /// Newest-first notifications addressed to `receiver_id`, at most
    /// `limit`. With `unread_only` the read ones are filtered out.
    async fn list_for_receiver(
        &self,
        receiver_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> NotificationResult<Vec<Notification>>;

    async fn unread_count(&self, receiver_id: Uuid) -> NotificationResult<u64>;

    /// Mark one notification read. Returns false when no notification with
    /// this id is addressed to `receiver_id`.
    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> NotificationResult<bool>;

    /// Mark every unread notification of `receiver_id` read. Returns the
    /// number of notifications that changed state.
    async fn mark_all_read(&self, receiver_id: Uuid) -> NotificationResult<u64>;
}

/// In-memory implementation of NotificationRepository for testing
#[derive(Clone, Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<HashMap<Uuid, Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: Notification) -> NotificationResult<Notification> {
        let mut notifications = self.notifications.write().await;
        notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_for_receiver(
        &self,
        receiver_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> NotificationResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let mut result: Vec<Notification> = notifications
            .values()
            .filter(|n| n.receiver_id == receiver_id && (!unread_only || !n.read))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit.max(0) as usize);
        Ok(result)
    }

    async fn unread_count(&self, receiver_id: Uuid) -> NotificationResult<u64> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .values()
            .filter(|n| n.receiver_id == receiver_id && !n.read)
            .count() as u64)
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> NotificationResult<bool> {
        let mut notifications = self.notifications.write().await;
        match notifications.get_mut(&id) {
            Some(notification) if notification.receiver_id == receiver_id => {
                notification.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, receiver_id: Uuid) -> NotificationResult<u64> {
        let mut notifications = self.notifications.write().await;
        let mut changed = 0;
        for notification in notifications.values_mut() {
            if notification.receiver_id == receiver_id && !notification.read {
                notification.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    fn commande(receiver: Uuid, message: impl Into<String>) -> Notification {
        Notification::new(Uuid::new_v4(), receiver, NotificationKind::Commande, message)
    }

    #[tokio::test]
    async fn list_is_newest_first_and_capped() {
        let repo = InMemoryNotificationRepository::new();
        let receiver = Uuid::new_v4();

        for i in 0..5 {
            repo.insert(commande(receiver, format!("message {i}")))
                .await
                .unwrap();
        }

        let feed = repo.list_for_receiver(receiver, false, 3).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert!(feed[0].created_at >= feed[1].created_at);
        assert!(feed[1].created_at >= feed[2].created_at);
    }

    #[tokio::test]
    async fn unread_only_hides_acknowledged_notifications() {
        let repo = InMemoryNotificationRepository::new();
        let receiver = Uuid::new_v4();

        let seen = repo.insert(commande(receiver, "ancienne")).await.unwrap();
        repo.insert(commande(receiver, "nouvelle")).await.unwrap();
        repo.mark_read(seen.id, receiver).await.unwrap();

        let unread = repo.list_for_receiver(receiver, true, 50).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].message, "nouvelle");

        let all = repo.list_for_receiver(receiver, false, 50).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn mark_read_is_scoped_to_receiver() {
        let repo = InMemoryNotificationRepository::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let notification = repo.insert(commande(owner, "Commande expédiée")).await.unwrap();

        assert!(!repo.mark_read(notification.id, stranger).await.unwrap());
        assert_eq!(repo.unread_count(owner).await.unwrap(), 1);

        assert!(repo.mark_read(notification.id, owner).await.unwrap());
        assert_eq!(repo.unread_count(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_all_read_does_not_touch_other_receivers() {
        let repo = InMemoryNotificationRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        repo.insert(commande(alice, "a1")).await.unwrap();
        repo.insert(commande(alice, "a2")).await.unwrap();
        repo.insert(commande(bob, "b1")).await.unwrap();

        let changed = repo.mark_all_read(alice).await.unwrap();
        assert_eq!(changed, 2);
        assert_eq!(repo.unread_count(alice).await.unwrap(), 0);
        assert_eq!(repo.unread_count(bob).await.unwrap(), 1);
    }
}
