//! Business logic for durable notifications

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationKind, FEED_LIMIT};
use crate::repository::NotificationRepository;

/// Notification service containing business logic
pub struct NotificationService<R: NotificationRepository> {
    repository: Arc<R>,
}

impl<R: NotificationRepository> NotificationService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Record a notification for a user. Called by other domains when an
    /// order or support ticket changes state.
    #[instrument(skip(self, message))]
    pub async fn record(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> NotificationResult<Notification> {
        let notification = Notification::new(sender_id, receiver_id, kind, message);
        self.repository.insert(notification).await
    }

    /// The receiver's feed, newest-first, capped at [`FEED_LIMIT`].
    #[instrument(skip(self))]
    pub async fn feed(
        &self,
        receiver_id: Uuid,
        unread_only: bool,
    ) -> NotificationResult<Vec<Notification>> {
        self.repository
            .list_for_receiver(receiver_id, unread_only, FEED_LIMIT)
            .await
    }

    #[instrument(skip(self))]
    pub async fn unread_count(&self, receiver_id: Uuid) -> NotificationResult<u64> {
        self.repository.unread_count(receiver_id).await
    }

    /// Acknowledge one notification on behalf of its receiver.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, receiver_id: Uuid, id: Uuid) -> NotificationResult<()> {
        let marked = self.repository.mark_read(id, receiver_id).await?;
        if !marked {
            return Err(NotificationError::NotFound(id));
        }
        Ok(())
    }

    /// Acknowledge everything addressed to the receiver.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, receiver_id: Uuid) -> NotificationResult<u64> {
        self.repository.mark_all_read(receiver_id).await
    }
}

impl<R: NotificationRepository> Clone for NotificationService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryNotificationRepository;

    fn service() -> NotificationService<InMemoryNotificationRepository> {
        NotificationService::new(Arc::new(InMemoryNotificationRepository::new()))
    }

    #[tokio::test]
    async fn record_then_feed_round_trip() {
        let service = service();
        let receiver = Uuid::new_v4();

        service
            .record(
                Uuid::new_v4(),
                receiver,
                NotificationKind::Commande,
                "Votre commande est en route",
            )
            .await
            .unwrap();

        let feed = service.feed(receiver, true).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].message, "Votre commande est en route");
        assert_eq!(feed[0].kind, NotificationKind::Commande);
        assert!(!feed[0].read);
    }

    #[tokio::test]
    async fn mark_read_rejects_foreign_notification() {
        let service = service();
        let owner = Uuid::new_v4();
        let notification = service
            .record(Uuid::new_v4(), owner, NotificationKind::Probleme, "test")
            .await
            .unwrap();

        let err = service
            .mark_read(Uuid::new_v4(), notification.id)
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::NotFound(_)));

        service.mark_read(owner, notification.id).await.unwrap();
        assert_eq!(service.unread_count(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn feed_is_capped() {
        let service = service();
        let receiver = Uuid::new_v4();

        let sender = Uuid::new_v4();
        for i in 0..(FEED_LIMIT + 10) {
            service
                .record(sender, receiver, NotificationKind::Commande, format!("m{i}"))
                .await
                .unwrap();
        }

        let feed = service.feed(receiver, false).await.unwrap();
        assert_eq!(feed.len(), FEED_LIMIT as usize);
    }
}
