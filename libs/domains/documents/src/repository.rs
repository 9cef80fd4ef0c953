use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DocumentError, DocumentResult};
use crate::models::{BundleStatus, DocumentBundle};

/// Repository trait for paperwork persistence operations
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a bundle. Fails with [`DocumentError::AlreadySubmitted`] when
    /// the user already has one.
    async fn insert(&self, bundle: DocumentBundle) -> DocumentResult<DocumentBundle>;
    async fn get_by_id(&self, id: Uuid) -> DocumentResult<Option<DocumentBundle>>;
    async fn get_by_user(&self, user_id: Uuid) -> DocumentResult<Option<DocumentBundle>>;
    async fn list(&self, limit: i64, offset: u64) -> DocumentResult<Vec<DocumentBundle>>;
    async fn set_status(
        &self,
        id: Uuid,
        status: BundleStatus,
    ) -> DocumentResult<Option<DocumentBundle>>;
}

/// In-memory implementation of DocumentRepository for testing
#[derive(Clone, Default)]
pub struct InMemoryDocumentRepository {
    bundles: Arc<RwLock<HashMap<Uuid, DocumentBundle>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn insert(&self, bundle: DocumentBundle) -> DocumentResult<DocumentBundle> {
        let mut bundles = self.bundles.write().await;
        if bundles.values().any(|b| b.user_id == bundle.user_id) {
            return Err(DocumentError::AlreadySubmitted(bundle.user_id));
        }
        bundles.insert(bundle.id, bundle.clone());
        Ok(bundle)
    }

    async fn get_by_id(&self, id: Uuid) -> DocumentResult<Option<DocumentBundle>> {
        let bundles = self.bundles.read().await;
        Ok(bundles.get(&id).cloned())
    }

    async fn get_by_user(&self, user_id: Uuid) -> DocumentResult<Option<DocumentBundle>> {
        let bundles = self.bundles.read().await;
        Ok(bundles.values().find(|b| b.user_id == user_id).cloned())
    }

    async fn list(&self, limit: i64, offset: u64) -> DocumentResult<Vec<DocumentBundle>> {
        let bundles = self.bundles.read().await;
        let mut all: Vec<DocumentBundle> = bundles.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: BundleStatus,
    ) -> DocumentResult<Option<DocumentBundle>> {
        let mut bundles = self.bundles.write().await;
        match bundles.get_mut(&id) {
            Some(bundle) => {
                bundle.status = status;
                bundle.updated_at = chrono::Utc::now();
                Ok(Some(bundle.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_helpers::auth::Role;

    #[tokio::test]
    async fn one_bundle_per_user() {
        let repo = InMemoryDocumentRepository::new();
        let user_id = Uuid::new_v4();

        repo.insert(DocumentBundle::new(
            user_id,
            Role::Client,
            vec!["cni.pdf".into()],
        ))
        .await
        .unwrap();

        let err = repo
            .insert(DocumentBundle::new(
                user_id,
                Role::Client,
                vec!["autre.pdf".into()],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::AlreadySubmitted(id) if id == user_id));
    }

    #[tokio::test]
    async fn status_flip_touches_updated_at() {
        let repo = InMemoryDocumentRepository::new();
        let bundle = repo
            .insert(DocumentBundle::new(
                Uuid::new_v4(),
                Role::Client,
                vec!["cni.pdf".into()],
            ))
            .await
            .unwrap();

        let approved = repo
            .set_status(bundle.id, BundleStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, BundleStatus::Approved);
        assert!(approved.updated_at >= bundle.updated_at);

        assert!(repo
            .set_status(Uuid::new_v4(), BundleStatus::Rejected)
            .await
            .unwrap()
            .is_none());
    }
}
