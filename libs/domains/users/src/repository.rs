use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter, UserStatus};

/// Repository trait for user persistence operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `DuplicateEmail` when the (lowercase)
    /// email is already taken.
    async fn create(&self, user: User) -> UserResult<User>;
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>>;

    /// Replace the stored document with `user`.
    async fn update(&self, user: User) -> UserResult<User>;
    async fn delete(&self, id: Uuid) -> UserResult<bool>;
    async fn set_status(&self, id: Uuid, status: UserStatus) -> UserResult<bool>;
}

/// Persistence seam for one-shot credentials: refresh-token `jti`s and
/// password-reset tokens. Both are consumed on use (`take_*` removes the
/// record and returns its owner).
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn store_refresh(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> UserResult<()>;
    async fn take_refresh(&self, jti: Uuid) -> UserResult<Option<Uuid>>;
    async fn revoke_refresh_for_user(&self, user_id: Uuid) -> UserResult<u64>;

    async fn store_reset(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> UserResult<()>;
    async fn take_reset(&self, token: &str) -> UserResult<Option<Uuid>>;
}

fn matches_filter(user: &User, filter: &UserFilter) -> bool {
    if let Some(role) = filter.role {
        if user.role != role {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if user.status != status {
            return false;
        }
    }
    if let Some(ref search) = filter.search {
        let needle = search.to_lowercase();
        if !user.name.to_lowercase().contains(&needle) && !user.email.contains(&needle) {
            return false;
        }
    }
    true
}

/// In-memory implementation of UserRepository for testing
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email == user.email.to_lowercase())
        {
            return Err(UserError::DuplicateEmail(user.email));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        let needle = email.to_lowercase();
        Ok(users.values().find(|u| u.email == needle).cloned())
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users
            .values()
            .filter(|u| matches_filter(u, &filter))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;
        Ok(users.remove(&id).is_some())
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> UserResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.status = status;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory implementation of TokenStore for testing
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    refresh: Arc<RwLock<HashMap<Uuid, (Uuid, DateTime<Utc>)>>>,
    reset: Arc<RwLock<HashMap<String, (Uuid, DateTime<Utc>)>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn store_refresh(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> UserResult<()> {
        let mut refresh = self.refresh.write().await;
        refresh.insert(jti, (user_id, expires_at));
        Ok(())
    }

    async fn take_refresh(&self, jti: Uuid) -> UserResult<Option<Uuid>> {
        let mut refresh = self.refresh.write().await;
        match refresh.remove(&jti) {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(Some(user_id)),
            _ => Ok(None),
        }
    }

    async fn revoke_refresh_for_user(&self, user_id: Uuid) -> UserResult<u64> {
        let mut refresh = self.refresh.write().await;
        let before = refresh.len();
        refresh.retain(|_, (owner, _)| *owner != user_id);
        Ok((before - refresh.len()) as u64)
    }

    async fn store_reset(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> UserResult<()> {
        let mut reset = self.reset.write().await;
        reset.insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn take_reset(&self, token: &str) -> UserResult<Option<Uuid>> {
        let mut reset = self.reset.write().await;
        match reset.remove(token) {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(Some(user_id)),
            _ => Ok(None),
        }
    }
}
