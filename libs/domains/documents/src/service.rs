use axum_helpers::auth::Role;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{DocumentError, DocumentResult};
use crate::models::{required_documents, BundleStatus, DocumentBundle};
use crate::repository::DocumentRepository;
use domain_users::models::UserStatus;
use domain_users::repository::UserRepository;

/// Service layer for paperwork review.
///
/// Submission enforces the per-role document count; approval flips the
/// bundle and activates the owning account in the same operation.
pub struct DocumentService<D, U>
where
    D: DocumentRepository,
    U: UserRepository,
{
    documents: Arc<D>,
    users: Arc<U>,
}

impl<D, U> DocumentService<D, U>
where
    D: DocumentRepository,
    U: UserRepository,
{
    pub fn new(documents: Arc<D>, users: Arc<U>) -> Self {
        Self { documents, users }
    }

    /// Submit a paperwork bundle. `files` are the stored file names, already
    /// written to disk by the upload layer.
    #[instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        role: Role,
        files: Vec<String>,
    ) -> DocumentResult<DocumentBundle> {
        let expected = required_documents(role).ok_or(DocumentError::RoleNotEligible)?;
        if files.len() != expected {
            return Err(DocumentError::WrongDocumentCount {
                expected,
                received: files.len(),
            });
        }

        self.documents
            .insert(DocumentBundle::new(user_id, role, files))
            .await
    }

    /// The caller's own bundle.
    #[instrument(skip(self))]
    pub async fn my_bundle(&self, user_id: Uuid) -> DocumentResult<DocumentBundle> {
        self.documents
            .get_by_user(user_id)
            .await?
            .ok_or(DocumentError::NoBundle(user_id))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, limit: i64, offset: u64) -> DocumentResult<Vec<DocumentBundle>> {
        self.documents.list(limit, offset).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> DocumentResult<DocumentBundle> {
        self.documents
            .get_by_id(id)
            .await?
            .ok_or(DocumentError::NotFound(id))
    }

    /// Approve a bundle and activate the owning account.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: Uuid) -> DocumentResult<DocumentBundle> {
        let bundle = self
            .documents
            .set_status(id, BundleStatus::Approved)
            .await?
            .ok_or(DocumentError::NotFound(id))?;

        let activated = self
            .users
            .set_status(bundle.user_id, UserStatus::Activated)
            .await?;
        if !activated {
            tracing::warn!(
                user_id = %bundle.user_id,
                "Approved paperwork for an account that no longer exists"
            );
        }
        Ok(bundle)
    }

    /// Reject a bundle. The account stays inactive.
    #[instrument(skip(self))]
    pub async fn reject(&self, id: Uuid) -> DocumentResult<DocumentBundle> {
        self.documents
            .set_status(id, BundleStatus::Rejected)
            .await?
            .ok_or(DocumentError::NotFound(id))
    }
}

impl<D, U> Clone for DocumentService<D, U>
where
    D: DocumentRepository,
    U: UserRepository,
{
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            users: Arc::clone(&self.users),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryDocumentRepository;
    use domain_users::models::{RegisterUser, User};
    use domain_users::repository::InMemoryUserRepository;

    struct Fixture {
        service: DocumentService<InMemoryDocumentRepository, InMemoryUserRepository>,
        users: Arc<InMemoryUserRepository>,
    }

    fn fixture() -> Fixture {
        let documents = Arc::new(InMemoryDocumentRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        Fixture {
            service: DocumentService::new(documents, Arc::clone(&users)),
            users,
        }
    }

    async fn seeded_user(f: &Fixture, role: Role) -> User {
        let user = User::new(
            RegisterUser {
                name: "Labo Lavoisier".to_string(),
                email: format!("{}@labo.fr", Uuid::new_v4()),
                password: "motdepasse".to_string(),
                role,
                labo_type: None,
            },
            "hash".to_string(),
        );
        f.users.create(user).await.unwrap()
    }

    #[tokio::test]
    async fn supplier_must_provide_exactly_three_documents() {
        let f = fixture();
        let user = seeded_user(&f, Role::Supplier).await;

        let err = f
            .service
            .submit(user.id, Role::Supplier, vec!["kbis.pdf".into()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocumentError::WrongDocumentCount {
                expected: 3,
                received: 1
            }
        ));

        f.service
            .submit(
                user.id,
                Role::Supplier,
                vec!["kbis.pdf".into(), "cni.pdf".into(), "rib.pdf".into()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn client_provides_a_single_identity_document() {
        let f = fixture();
        let user = seeded_user(&f, Role::Client).await;

        let err = f
            .service
            .submit(
                user.id,
                Role::Client,
                vec!["cni.pdf".into(), "extra.pdf".into()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::WrongDocumentCount { .. }));

        let bundle = f
            .service
            .submit(user.id, Role::Client, vec!["cni.pdf".into()])
            .await
            .unwrap();
        assert_eq!(bundle.status, BundleStatus::Pending);
    }

    #[tokio::test]
    async fn resubmission_conflicts() {
        let f = fixture();
        let user = seeded_user(&f, Role::Client).await;

        f.service
            .submit(user.id, Role::Client, vec!["cni.pdf".into()])
            .await
            .unwrap();
        let err = f
            .service
            .submit(user.id, Role::Client, vec!["cni2.pdf".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::AlreadySubmitted(id) if id == user.id));
    }

    #[tokio::test]
    async fn approval_activates_the_account() {
        let f = fixture();
        let user = seeded_user(&f, Role::Client).await;
        assert_eq!(user.status, UserStatus::NotActivated);

        let bundle = f
            .service
            .submit(user.id, Role::Client, vec!["cni.pdf".into()])
            .await
            .unwrap();

        let approved = f.service.approve(bundle.id).await.unwrap();
        assert_eq!(approved.status, BundleStatus::Approved);

        let refreshed = f.users.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.status, UserStatus::Activated);
    }

    #[tokio::test]
    async fn rejection_leaves_the_account_inactive() {
        let f = fixture();
        let user = seeded_user(&f, Role::Client).await;
        let bundle = f
            .service
            .submit(user.id, Role::Client, vec!["cni.pdf".into()])
            .await
            .unwrap();

        let rejected = f.service.reject(bundle.id).await.unwrap();
        assert_eq!(rejected.status, BundleStatus::Rejected);

        let refreshed = f.users.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.status, UserStatus::NotActivated);
    }

    #[tokio::test]
    async fn admins_cannot_submit_paperwork() {
        let f = fixture();
        let err = f
            .service
            .submit(Uuid::new_v4(), Role::Admin, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::RoleNotEligible));
    }
}
