//! MongoDB implementation of SubscriptionRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::SubscriptionResult;
use crate::models::{Subscription, SubscriptionStatus, UpdateSubscription};
use crate::repository::SubscriptionRepository;

/// MongoDB implementation of the SubscriptionRepository
pub struct MongoSubscriptionRepository {
    collection: Collection<Subscription>,
}

impl MongoSubscriptionRepository {
    /// Create a new MongoSubscriptionRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Subscription>("subscriptions");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> SubscriptionResult<()> {
        let indexes = vec![
            // Login gate: latest window per user
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_user_created".to_string())
                        .build(),
                )
                .build(),
            // Expiry sweeps and dashboards
            IndexModel::builder()
                .keys(doc! { "status": 1, "end_date": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_status_end".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Subscription indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for MongoSubscriptionRepository {
    #[instrument(skip(self, subscription), fields(user_id = %subscription.user_id))]
    async fn insert(&self, subscription: Subscription) -> SubscriptionResult<Subscription> {
        self.collection.insert_one(&subscription).await?;

        tracing::info!(subscription_id = %subscription.id, "Subscription created successfully");
        Ok(subscription)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> SubscriptionResult<Option<Subscription>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let subscription = self.collection.find_one(filter).await?;
        Ok(subscription)
    }

    #[instrument(skip(self))]
    async fn latest_for_user(&self, user_id: Uuid) -> SubscriptionResult<Option<Subscription>> {
        let filter = doc! { "user_id": to_bson(&user_id).unwrap_or(Bson::Null) };
        let subscription = self
            .collection
            .find_one(filter)
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(subscription)
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: i64, offset: u64) -> SubscriptionResult<Vec<Subscription>> {
        use futures::TryStreamExt;

        let options = mongodb::options::FindOptions::builder()
            .limit(limit)
            .skip(offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let subscriptions: Vec<Subscription> = cursor.try_collect().await?;

        Ok(subscriptions)
    }

    #[instrument(skip(self, update))]
    async fn update(
        &self,
        id: Uuid,
        update: UpdateSubscription,
    ) -> SubscriptionResult<Option<Subscription>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let existing = self.collection.find_one(filter.clone()).await?;

        let Some(mut subscription) = existing else {
            return Ok(None);
        };
        subscription.apply_update(update);

        self.collection.replace_one(filter, &subscription).await?;

        tracing::info!(subscription_id = %id, "Subscription updated successfully");
        Ok(Some(subscription))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> SubscriptionResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let result = self.collection.delete_one(filter).await?;

        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn set_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> SubscriptionResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let update = doc! {
            "$set": {
                "status": to_bson(&status).unwrap_or(Bson::Null),
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }
        };

        let result = self.collection.update_one(filter, update).await?;
        Ok(result.matched_count > 0)
    }
}
