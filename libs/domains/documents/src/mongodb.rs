//! MongoDB implementation of DocumentRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{DocumentError, DocumentResult};
use crate::models::{BundleStatus, DocumentBundle};
use crate::repository::DocumentRepository;

const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

/// MongoDB implementation of the DocumentRepository
pub struct MongoDocumentRepository {
    collection: Collection<DocumentBundle>,
}

impl MongoDocumentRepository {
    /// Create a new MongoDocumentRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<DocumentBundle>("papiers");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> DocumentResult<()> {
        let indexes = vec![
            // One bundle per user, enforced at the storage layer
            IndexModel::builder()
                .keys(doc! { "user_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_user_unique".to_string())
                        .unique(true)
                        .build(),
                )
                .build(),
            // Admin review queue, pending first by age
            IndexModel::builder()
                .keys(doc! { "status": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_status_created".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Document bundle indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<DocumentBundle> {
        &self.collection
    }
}

#[async_trait]
impl DocumentRepository for MongoDocumentRepository {
    #[instrument(skip(self, bundle), fields(bundle_id = %bundle.id, user_id = %bundle.user_id))]
    async fn insert(&self, bundle: DocumentBundle) -> DocumentResult<DocumentBundle> {
        match self.collection.insert_one(&bundle).await {
            Ok(_) => {
                tracing::info!(
                    bundle_id = %bundle.id,
                    files = bundle.files.len(),
                    "Paperwork submitted"
                );
                Ok(bundle)
            }
            Err(e) if is_duplicate_key(&e) => Err(DocumentError::AlreadySubmitted(bundle.user_id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> DocumentResult<Option<DocumentBundle>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let bundle = self.collection.find_one(filter).await?;
        Ok(bundle)
    }

    #[instrument(skip(self))]
    async fn get_by_user(&self, user_id: Uuid) -> DocumentResult<Option<DocumentBundle>> {
        let filter = doc! { "user_id": to_bson(&user_id).unwrap_or(Bson::Null) };
        let bundle = self.collection.find_one(filter).await?;
        Ok(bundle)
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: i64, offset: u64) -> DocumentResult<Vec<DocumentBundle>> {
        use futures::TryStreamExt;

        let options = mongodb::options::FindOptions::builder()
            .limit(limit)
            .skip(offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let bundles: Vec<DocumentBundle> = cursor.try_collect().await?;
        Ok(bundles)
    }

    #[instrument(skip(self))]
    async fn set_status(
        &self,
        id: Uuid,
        status: BundleStatus,
    ) -> DocumentResult<Option<DocumentBundle>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let update = doc! {
            "$set": {
                "status": to_bson(&status).unwrap_or(Bson::Null),
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(bundle_id = %id, status = %status, "Paperwork reviewed");
        }
        Ok(updated)
    }
}
