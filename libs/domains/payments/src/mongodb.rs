//! MongoDB implementation of PaymentRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{PaymentError, PaymentResult};
use crate::models::Payment;
use crate::repository::PaymentRepository;

const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

/// MongoDB implementation of the PaymentRepository
pub struct MongoPaymentRepository {
    collection: Collection<Payment>,
}

impl MongoPaymentRepository {
    /// Create a new MongoPaymentRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Payment>("payments");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> PaymentResult<()> {
        let indexes = vec![
            // One payment per order, enforced at the storage layer
            IndexModel::builder()
                .keys(doc! { "order_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_order_unique".to_string())
                        .unique(true)
                        .build(),
                )
                .build(),
            // Client payment history
            IndexModel::builder()
                .keys(doc! { "client_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_client_created".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Payment indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Payment> {
        &self.collection
    }

    async fn find_page(
        &self,
        filter: mongodb::bson::Document,
        limit: i64,
        offset: u64,
    ) -> PaymentResult<Vec<Payment>> {
        use futures::TryStreamExt;

        let options = mongodb::options::FindOptions::builder()
            .limit(limit)
            .skip(offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        let payments: Vec<Payment> = cursor.try_collect().await?;
        Ok(payments)
    }
}

#[async_trait]
impl PaymentRepository for MongoPaymentRepository {
    #[instrument(skip(self, payment), fields(payment_id = %payment.id, order_id = %payment.order_id))]
    async fn insert(&self, payment: Payment) -> PaymentResult<Payment> {
        match self.collection.insert_one(&payment).await {
            Ok(_) => {
                tracing::info!(payment_id = %payment.id, amount = payment.amount, "Payment recorded");
                Ok(payment)
            }
            Err(e) if is_duplicate_key(&e) => Err(PaymentError::DuplicateOrder(payment.order_id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> PaymentResult<Option<Payment>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let payment = self.collection.find_one(filter).await?;
        Ok(payment)
    }

    #[instrument(skip(self))]
    async fn list_for_client(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: u64,
    ) -> PaymentResult<Vec<Payment>> {
        let filter = doc! { "client_id": to_bson(&client_id).unwrap_or(Bson::Null) };
        self.find_page(filter, limit, offset).await
    }

    #[instrument(skip(self))]
    async fn list_all(&self, limit: i64, offset: u64) -> PaymentResult<Vec<Payment>> {
        self.find_page(doc! {}, limit, offset).await
    }

    #[instrument(skip(self))]
    async fn set_proof(&self, id: Uuid, file_name: &str) -> PaymentResult<Option<Payment>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let update = doc! {
            "$set": {
                "proof_file": file_name,
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(payment_id = %id, file_name, "Payment proof attached");
        }
        Ok(updated)
    }
}
