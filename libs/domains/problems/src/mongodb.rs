//! MongoDB implementation of ProblemRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProblemResult;
use crate::models::{Problem, ProblemStatus};
use crate::repository::ProblemRepository;

/// MongoDB implementation of the ProblemRepository
pub struct MongoProblemRepository {
    collection: Collection<Problem>,
}

impl MongoProblemRepository {
    /// Create a new MongoProblemRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Problem>("problems");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> ProblemResult<()> {
        let indexes = vec![
            // Admin triage queue, open tickets by age
            IndexModel::builder()
                .keys(doc! { "status": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_status_created".to_string())
                        .build(),
                )
                .build(),
            // Per-reporter history
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_user_created".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Problem indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Problem> {
        &self.collection
    }
}

#[async_trait]
impl ProblemRepository for MongoProblemRepository {
    #[instrument(skip(self, problem), fields(problem_id = %problem.id, user_id = %problem.user_id))]
    async fn insert(&self, problem: Problem) -> ProblemResult<Problem> {
        self.collection.insert_one(&problem).await?;

        tracing::info!(problem_id = %problem.id, "Problem reported");
        Ok(problem)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProblemResult<Option<Problem>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let problem = self.collection.find_one(filter).await?;
        Ok(problem)
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: i64, offset: u64) -> ProblemResult<Vec<Problem>> {
        use futures::TryStreamExt;

        let options = mongodb::options::FindOptions::builder()
            .limit(limit)
            .skip(offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let problems: Vec<Problem> = cursor.try_collect().await?;
        Ok(problems)
    }

    #[instrument(skip(self))]
    async fn set_status(
        &self,
        id: Uuid,
        status: ProblemStatus,
    ) -> ProblemResult<Option<Problem>> {
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
            tracing::info!(problem_id = %id, status = %status, "Problem status updated");
        }
        Ok(updated)
    }
}
