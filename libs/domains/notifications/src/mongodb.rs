//! MongoDB implementation of NotificationRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::NotificationResult;
use crate::models::Notification;
use crate::repository::NotificationRepository;

/// MongoDB implementation of the NotificationRepository
pub struct MongoNotificationRepository {
    collection: Collection<Notification>,
}

impl MongoNotificationRepository {
    /// Create a new MongoNotificationRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Notification>("notifications");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> NotificationResult<()> {
        let indexes = vec![
            // Feed queries: newest-first per receiver
            IndexModel::builder()
                .keys(doc! { "receiver_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_receiver_created".to_string())
                        .build(),
                )
                .build(),
            // Unread badge counts
            IndexModel::builder()
                .keys(doc! { "receiver_id": 1, "read": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_receiver_read".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Notification indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for MongoNotificationRepository {
    #[instrument(skip(self, notification), fields(receiver_id = %notification.receiver_id))]
    async fn insert(&self, notification: Notification) -> NotificationResult<Notification> {
        self.collection.insert_one(&notification).await?;
        Ok(notification)
    }

    #[instrument(skip(self))]
    async fn list_for_receiver(
        &self,
        receiver_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> NotificationResult<Vec<Notification>> {
        use futures::TryStreamExt;

        let mut filter = doc! { "receiver_id": to_bson(&receiver_id).unwrap_or(Bson::Null) };
        if unread_only {
            filter.insert("read", false);
        }
        let options = mongodb::options::FindOptions::builder()
            .limit(limit)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        let notifications: Vec<Notification> = cursor.try_collect().await?;

        Ok(notifications)
    }

    #[instrument(skip(self))]
    async fn unread_count(&self, receiver_id: Uuid) -> NotificationResult<u64> {
        let filter = doc! {
            "receiver_id": to_bson(&receiver_id).unwrap_or(Bson::Null),
            "read": false,
        };
        let count = self.collection.count_documents(filter).await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> NotificationResult<bool> {
        // Receiver is part of the filter so users cannot acknowledge
        // notifications addressed to somebody else.
        let filter = doc! {
            "_id": to_bson(&id).unwrap_or(Bson::Null),
            "receiver_id": to_bson(&receiver_id).unwrap_or(Bson::Null),
        };
        let update = doc! { "$set": { "read": true } };

        let result = self.collection.update_one(filter, update).await?;
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, receiver_id: Uuid) -> NotificationResult<u64> {
        let filter = doc! {
            "receiver_id": to_bson(&receiver_id).unwrap_or(Bson::Null),
            "read": false,
        };
        let update = doc! { "$set": { "read": true } };

        let result = self.collection.update_many(filter, update).await?;
        Ok(result.modified_count)
    }
}
