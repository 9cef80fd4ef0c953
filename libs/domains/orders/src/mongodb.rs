//! MongoDB implementation of OrderRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::OrderResult;
use crate::models::{Order, OrderStatus};
use crate::repository::OrderRepository;

/// MongoDB implementation of the OrderRepository
pub struct MongoOrderRepository {
    collection: Collection<Order>,
}

impl MongoOrderRepository {
    /// Create a new MongoOrderRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Order>("orders");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> OrderResult<()> {
        let indexes = vec![
            // Client order history
            IndexModel::builder()
                .keys(doc! { "client_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_client_created".to_string())
                        .build(),
                )
                .build(),
            // Supplier inbox
            IndexModel::builder()
                .keys(doc! { "supplier_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_supplier_created".to_string())
                        .build(),
                )
                .build(),
            // Admin dashboards group by status
            IndexModel::builder()
                .keys(doc! { "status": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_status".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Order indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Order> {
        &self.collection
    }

    async fn find_page(
        &self,
        filter: mongodb::bson::Document,
        limit: i64,
        offset: u64,
    ) -> OrderResult<Vec<Order>> {
        use futures::TryStreamExt;

        let options = mongodb::options::FindOptions::builder()
            .limit(limit)
            .skip(offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        let orders: Vec<Order> = cursor.try_collect().await?;
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for MongoOrderRepository {
    #[instrument(skip(self, order), fields(order_id = %order.id, supplier_id = %order.supplier_id))]
    async fn insert(&self, order: Order) -> OrderResult<Order> {
        self.collection.insert_one(&order).await?;

        tracing::info!(order_id = %order.id, total = order.total, "Order created successfully");
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<Order>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let order = self.collection.find_one(filter).await?;
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn list_for_client(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> OrderResult<Vec<Order>> {
        let filter = doc! { "client_id": to_bson(&client_id).unwrap_or(Bson::Null) };
        self.find_page(filter, limit, offset).await
    }

    #[instrument(skip(self))]
    async fn list_for_supplier(
        &self,
        supplier_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> OrderResult<Vec<Order>> {
        let filter = doc! { "supplier_id": to_bson(&supplier_id).unwrap_or(Bson::Null) };
        self.find_page(filter, limit, offset).await
    }

    #[instrument(skip(self))]
    async fn list_all(&self, limit: i64, offset: u64) -> OrderResult<Vec<Order>> {
        self.find_page(doc! {}, limit, offset).await
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> OrderResult<Option<Order>> {
        // The expected status is part of the filter so two racing writers
        // cannot interleave read-validate-write and revert a transition.
        let filter = doc! {
            "_id": to_bson(&id).unwrap_or(Bson::Null),
            "status": to_bson(&from).unwrap_or(Bson::Null),
        };
        let update = doc! {
            "$set": {
                "status": to_bson(&to).unwrap_or(Bson::Null),
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(order_id = %id, status = %to, "Order status updated");
        }
        Ok(updated)
    }
}
