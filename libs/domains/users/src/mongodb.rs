//! MongoDB implementations of UserRepository and TokenStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, to_bson, Bson},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter, UserStatus};
use crate::repository::{TokenStore, UserRepository};

const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<User>("users");
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> UserResult<()> {
        let indexes = vec![
            // Login lookups and the uniqueness guarantee
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_email_unique".to_string())
                        .build(),
                )
                .build(),
            // Admin listings by role and status
            IndexModel::builder()
                .keys(doc! { "role": 1, "status": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_role_status".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("User indexes created successfully");
        Ok(())
    }

    /// Build a MongoDB filter document from UserFilter
    fn build_filter(filter: &UserFilter) -> mongodb::bson::Document {
        let mut doc = doc! {};

        if let Some(role) = filter.role {
            doc.insert("role", role.to_string());
        }
        if let Some(status) = filter.status {
            doc.insert("status", status.to_string());
        }
        if let Some(ref search) = filter.search {
            doc.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": search, "$options": "i" } },
                    doc! { "email": { "$regex": search, "$options": "i" } },
                ],
            );
        }

        doc
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: User) -> UserResult<User> {
        match self.collection.insert_one(&user).await {
            Ok(_) => {
                tracing::info!(user_id = %user.id, "User created successfully");
                Ok(user)
            }
            Err(e) if is_duplicate_key(&e) => Err(UserError::DuplicateEmail(user.email)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let user = self.collection.find_one(filter).await?;
        Ok(user)
    }

    #[instrument(skip(self, email))]
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let filter = doc! { "email": email.to_lowercase() };
        let user = self.collection.find_one(filter).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        use futures::TryStreamExt;

        let mongo_filter = Self::build_filter(&filter);
        let options = mongodb::options::FindOptions::builder()
            .limit(filter.limit)
            .skip(filter.offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: User) -> UserResult<User> {
        let filter = doc! { "_id": to_bson(&user.id).unwrap_or(Bson::Null) };
        let result = self.collection.replace_one(filter, &user).await?;

        if result.matched_count == 0 {
            return Err(UserError::NotFound(user.id));
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let result = self.collection.delete_one(filter).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn set_status(&self, id: Uuid, status: UserStatus) -> UserResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let update = doc! {
            "$set": {
                "status": status.to_string(),
                "updated_at": Utc::now().to_rfc3339(),
            }
        };

        let result = self.collection.update_one(filter, update).await?;
        if result.matched_count > 0 {
            tracing::info!(user_id = %id, status = %status, "User status updated");
        }
        Ok(result.matched_count > 0)
    }
}

/// Refresh-token rotation record. The TTL index on `expires_at` lets MongoDB
/// sweep stale entries; `take_refresh` still checks the timestamp because the
/// sweep is lazy.
#[derive(Debug, Serialize, Deserialize)]
struct RefreshTokenDoc {
    #[serde(rename = "_id")]
    jti: Uuid,
    user_id: Uuid,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    expires_at: DateTime<Utc>,
}

/// Password-reset token record, keyed by the opaque token itself.
#[derive(Debug, Serialize, Deserialize)]
struct ResetTokenDoc {
    #[serde(rename = "_id")]
    token: String,
    user_id: Uuid,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    expires_at: DateTime<Utc>,
}

/// MongoDB implementation of the TokenStore
pub struct MongoTokenStore {
    refresh: Collection<RefreshTokenDoc>,
    reset: Collection<ResetTokenDoc>,
}

impl MongoTokenStore {
    /// Create a new MongoTokenStore
    pub fn new(db: &Database) -> Self {
        Self {
            refresh: db.collection::<RefreshTokenDoc>("refresh_tokens"),
            reset: db.collection::<ResetTokenDoc>("reset_tokens"),
        }
    }

    /// Initialize TTL indexes so stale tokens disappear on their own
    pub async fn init_indexes(&self) -> UserResult<()> {
        let ttl = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(
                IndexOptions::builder()
                    .expire_after(Duration::from_secs(0))
                    .name("idx_expires_ttl".to_string())
                    .build(),
            )
            .build();

        self.refresh.create_index(ttl.clone()).await?;
        self.reset.create_index(ttl).await?;
        tracing::info!("Token TTL indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MongoTokenStore {
    #[instrument(skip(self))]
    async fn store_refresh(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> UserResult<()> {
        self.refresh
            .insert_one(&RefreshTokenDoc {
                jti,
                user_id,
                expires_at,
            })
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn take_refresh(&self, jti: Uuid) -> UserResult<Option<Uuid>> {
        let filter = doc! { "_id": to_bson(&jti).unwrap_or(Bson::Null) };
        let taken = self.refresh.find_one_and_delete(filter).await?;

        Ok(taken
            .filter(|record| record.expires_at > Utc::now())
            .map(|record| record.user_id))
    }

    #[instrument(skip(self))]
    async fn revoke_refresh_for_user(&self, user_id: Uuid) -> UserResult<u64> {
        let filter = doc! { "user_id": to_bson(&user_id).unwrap_or(Bson::Null) };
        let result = self.refresh.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    #[instrument(skip(self, token))]
    async fn store_reset(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> UserResult<()> {
        self.reset
            .insert_one(&ResetTokenDoc {
                token: token.to_string(),
                user_id,
                expires_at,
            })
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn take_reset(&self, token: &str) -> UserResult<Option<Uuid>> {
        let filter = doc! { "_id": token };
        let taken = self.reset.find_one_and_delete(filter).await?;

        Ok(taken
            .filter(|record| record.expires_at > Utc::now())
            .map(|record| record.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_helpers::auth::Role;

    #[test]
    fn test_build_filter_empty() {
        let filter = UserFilter::default();
        let doc = MongoUserRepository::build_filter(&filter);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_role_and_status_use_wire_names() {
        let filter = UserFilter {
            role: Some(Role::Supplier),
            status: Some(UserStatus::NotActivated),
            ..Default::default()
        };
        let doc = MongoUserRepository::build_filter(&filter);
        assert_eq!(doc.get_str("role").unwrap(), "supplier");
        assert_eq!(doc.get_str("status").unwrap(), "not_activated");
    }

    #[test]
    fn test_build_filter_with_search() {
        let filter = UserFilter {
            search: Some("curie".to_string()),
            ..Default::default()
        };
        let doc = MongoUserRepository::build_filter(&filter);
        assert!(doc.contains_key("$or"));
    }

    #[test]
    fn test_token_expiry_round_trips_as_bson_datetime() {
        // The TTL index only fires on native BSON datetimes, not on the
        // RFC 3339 strings chrono serializes to by default.
        let record = RefreshTokenDoc {
            jti: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };

        let doc = mongodb::bson::to_document(&record).unwrap();
        assert!(matches!(
            doc.get("expires_at"),
            Some(mongodb::bson::Bson::DateTime(_))
        ));

        let back: RefreshTokenDoc = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(back.jti, record.jti);
        assert_eq!(
            back.expires_at.timestamp_millis(),
            record.expires_at.timestamp_millis()
        );
    }
}
