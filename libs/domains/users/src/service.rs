//! Business logic for accounts, authentication, and the login gate

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use axum_helpers::auth::{JwtAuth, Role, REFRESH_TOKEN_TTL};
use domain_subscriptions::repository::SubscriptionRepository;
use domain_subscriptions::SubscriptionStatus;

use crate::error::{UserError, UserResult};
use crate::mailer::Mailer;
use crate::models::{
    AuthResponse, LoginRequest, RegisterUser, UpdateProfile, User, UserFilter, UserResponse,
    UserStatus,
};
use crate::repository::{TokenStore, UserRepository};

const RESET_TOKEN_TTL_MINUTES: i64 = 60;
const RESET_TOKEN_LEN: usize = 48;

/// User service containing business logic.
///
/// Login consults the subscription repository directly: the gate's side
/// effects (flipping an expired window and deactivating the account) belong
/// to the login attempt, not to any scheduled job.
pub struct UserService<R, T, S>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    users: Arc<R>,
    tokens: Arc<T>,
    subscriptions: Arc<S>,
    jwt: JwtAuth,
    mailer: Arc<dyn Mailer>,
}

impl<R, T, S> UserService<R, T, S>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    pub fn new(
        users: Arc<R>,
        tokens: Arc<T>,
        subscriptions: Arc<S>,
        jwt: JwtAuth,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            users,
            tokens,
            subscriptions,
            jwt,
            mailer,
        }
    }

    /// Register a new client or supplier account. Accounts start deactivated;
    /// an admin activates them after reviewing the document bundle.
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterUser) -> UserResult<UserResponse> {
        if input.role == Role::Admin {
            return Err(UserError::Validation(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(input, password_hash);
        let created = self.users.create(user).await?;
        Ok(created.into())
    }

    /// Authenticate and mint a token pair.
    ///
    /// Gate order matters: a deactivated account is reported before the
    /// subscription is consulted, so an account deactivated by an earlier
    /// expired-subscription login keeps answering `account_not_activated`.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<AuthResponse> {
        let user = self
            .users
            .get_by_email(&input.email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        if user.role.requires_subscription() {
            if !user.is_activated() {
                return Err(UserError::AccountNotActivated);
            }

            let subscription = self
                .subscriptions
                .latest_for_user(user.id)
                .await
                .map_err(|e| UserError::Internal(e.to_string()))?
                .ok_or(UserError::SubscriptionMissing)?;

            if subscription.is_expired_at(Utc::now()) {
                // Side effect of the attempt: both records catch up with
                // reality before the caller is turned away.
                if let Err(e) = self
                    .subscriptions
                    .set_status(subscription.id, SubscriptionStatus::Expired)
                    .await
                {
                    warn!(user_id = %user.id, "Failed to flip expired subscription: {}", e);
                }
                if let Err(e) = self
                    .users
                    .set_status(user.id, UserStatus::NotActivated)
                    .await
                {
                    warn!(user_id = %user.id, "Failed to deactivate account: {}", e);
                }
                return Err(UserError::SubscriptionExpired);
            }
        }

        self.issue_tokens(user).await
    }

    /// Rotate a refresh token: the presented `jti` is consumed and a fresh
    /// pair is minted. A replayed token finds no record and is rejected.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> UserResult<AuthResponse> {
        let claims = self
            .jwt
            .verify_token(refresh_token)
            .map_err(|_| UserError::InvalidToken)?;
        let jti = Uuid::parse_str(&claims.jti).map_err(|_| UserError::InvalidToken)?;
        let subject_id = claims.user_id().map_err(|_| UserError::InvalidToken)?;

        let owner = self
            .tokens
            .take_refresh(jti)
            .await?
            .ok_or(UserError::InvalidToken)?;
        if owner != subject_id {
            return Err(UserError::InvalidToken);
        }

        let user = self
            .users
            .get_by_id(subject_id)
            .await?
            .ok_or(UserError::InvalidToken)?;

        if user.role.requires_subscription() && !user.is_activated() {
            return Err(UserError::AccountNotActivated);
        }

        self.issue_tokens(user).await
    }

    /// Invalidate a refresh token ahead of its expiry.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, refresh_token: &str) -> UserResult<()> {
        if let Ok(claims) = self.jwt.verify_token(refresh_token) {
            if let Ok(jti) = Uuid::parse_str(&claims.jti) {
                self.tokens.take_refresh(jti).await?;
            }
        }
        Ok(())
    }

    async fn issue_tokens(&self, user: User) -> UserResult<AuthResponse> {
        let subject = user.token_subject();
        let access_token = self
            .jwt
            .create_access_token(&subject)
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let refresh_token = self
            .jwt
            .create_refresh_token(&subject)
            .map_err(|e| UserError::Internal(e.to_string()))?;

        // Persist the refresh jti so rotation can consume it exactly once
        let claims = self
            .jwt
            .verify_token(&refresh_token)
            .map_err(|e| UserError::Internal(e.to_string()))?;
        let jti = Uuid::parse_str(&claims.jti).map_err(|e| UserError::Internal(e.to_string()))?;
        self.tokens
            .store_refresh(
                jti,
                user.id,
                Utc::now() + Duration::seconds(REFRESH_TOKEN_TTL),
            )
            .await?;

        Ok(AuthResponse {
            success: true,
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> UserResult<UserResponse> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;
        Ok(user.into())
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfile,
    ) -> UserResult<UserResponse> {
        let mut user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(labo_type) = input.labo_type {
            user.labo_type = Some(labo_type);
        }
        user.updated_at = Utc::now();

        let updated = self.users.update(user).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        let mut user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.users.update(user).await?;

        // Old sessions should not outlive the password
        self.tokens.revoke_refresh_for_user(user_id).await?;
        Ok(())
    }

    /// Start a password reset. Always succeeds from the caller's point of
    /// view so the endpoint does not leak which emails exist.
    #[instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> UserResult<()> {
        let Some(user) = self.users.get_by_email(email).await? else {
            return Ok(());
        };

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RESET_TOKEN_LEN)
            .map(char::from)
            .collect();

        self.tokens
            .store_reset(
                &token,
                user.id,
                Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
            )
            .await?;

        let body = format!(
            "Bonjour {},\n\nUtilisez ce code pour réinitialiser votre mot de passe: {}\n\nIl expire dans {} minutes.",
            user.name, token, RESET_TOKEN_TTL_MINUTES
        );
        if let Err(e) = self
            .mailer
            .send(&user.email, "Réinitialisation du mot de passe", &body)
            .await
        {
            warn!(user_id = %user.id, "Failed to send reset email: {}", e);
        }

        Ok(())
    }

    /// Complete a password reset with a previously emailed token.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> UserResult<()> {
        let user_id = self
            .tokens
            .take_reset(token)
            .await?
            .ok_or(UserError::InvalidToken)?;

        let mut user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.users.update(user).await?;

        self.tokens.revoke_refresh_for_user(user_id).await?;
        Ok(())
    }

    // Admin operations

    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: UserFilter) -> UserResult<Vec<UserResponse>> {
        let users = self.users.list(filter).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        self.profile(id).await
    }

    /// Activate or deactivate an account.
    #[instrument(skip(self))]
    pub async fn set_user_status(&self, id: Uuid, status: UserStatus) -> UserResult<UserResponse> {
        let changed = self.users.set_status(id, status).await?;
        if !changed {
            return Err(UserError::NotFound(id));
        }
        self.profile(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        let deleted = self.users.delete(id).await?;
        if !deleted {
            return Err(UserError::NotFound(id));
        }
        self.tokens.revoke_refresh_for_user(id).await?;
        Ok(())
    }
}

impl<R, T, S> Clone for UserService<R, T, S>
where
    R: UserRepository,
    T: TokenStore,
    S: SubscriptionRepository,
{
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            tokens: Arc::clone(&self.tokens),
            subscriptions: Arc::clone(&self.subscriptions),
            jwt: self.jwt.clone(),
            mailer: Arc::clone(&self.mailer),
        }
    }
}

// Password helpers

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::LogMailer;
    use crate::repository::{InMemoryTokenStore, InMemoryUserRepository};
    use core_config::JwtConfig;
    use domain_subscriptions::models::CreateSubscription;
    use domain_subscriptions::repository::InMemorySubscriptionRepository;
    use domain_subscriptions::Subscription;

    struct Fixture {
        service: UserService<
            InMemoryUserRepository,
            InMemoryTokenStore,
            InMemorySubscriptionRepository,
        >,
        users: Arc<InMemoryUserRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let service = UserService::new(
            Arc::clone(&users),
            Arc::new(InMemoryTokenStore::new()),
            Arc::clone(&subscriptions),
            JwtAuth::new(&JwtConfig::new("unit-test-secret-key-of-32-chars!!")),
            Arc::new(LogMailer),
        );
        Fixture {
            service,
            users,
            subscriptions,
        }
    }

    fn register_input(email: &str, role: Role) -> RegisterUser {
        RegisterUser {
            name: "Labo Curie".to_string(),
            email: email.to_string(),
            password: "Str0ngPass!".to_string(),
            role,
            labo_type: None,
        }
    }

    fn login_input(email: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: "Str0ngPass!".to_string(),
        }
    }

    async fn grant_window(
        f: &Fixture,
        user_id: Uuid,
        start_days_ago: i64,
        length_days: i64,
    ) {
        let start = Utc::now() - Duration::days(start_days_ago);
        f.subscriptions
            .insert(Subscription::new(CreateSubscription {
                user_id,
                start_date: start,
                end_date: start + Duration::days(length_days),
            }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn register_hashes_password_and_starts_deactivated() {
        let f = fixture();
        let response = f
            .service
            .register(register_input("lab@example.com", Role::Client))
            .await
            .unwrap();

        assert_eq!(response.status, UserStatus::NotActivated);
        let stored = f.users.get_by_email("lab@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Str0ngPass!");
        assert!(verify_password("Str0ngPass!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_rejects_admin_role() {
        let f = fixture();
        let err = f
            .service
            .register(register_input("root@example.com", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn login_rejects_bad_password_and_unknown_email_alike() {
        let f = fixture();
        f.service
            .register(register_input("lab@example.com", Role::Client))
            .await
            .unwrap();

        let err = f
            .service
            .login(LoginRequest {
                email: "lab@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));

        let err = f
            .service
            .login(login_input("nobody@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
    }

    #[tokio::test]
    async fn deactivated_account_is_gated_before_subscription() {
        let f = fixture();
        f.service
            .register(register_input("lab@example.com", Role::Client))
            .await
            .unwrap();

        let err = f
            .service
            .login(login_input("lab@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::AccountNotActivated));
    }

    #[tokio::test]
    async fn activated_account_without_subscription_is_rejected() {
        let f = fixture();
        let user = f
            .service
            .register(register_input("lab@example.com", Role::Client))
            .await
            .unwrap();
        f.users
            .set_status(user.id, UserStatus::Activated)
            .await
            .unwrap();

        let err = f
            .service
            .login(login_input("lab@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::SubscriptionMissing));
    }

    #[tokio::test]
    async fn valid_subscription_logs_in_and_issues_rotating_tokens() {
        let f = fixture();
        let user = f
            .service
            .register(register_input("lab@example.com", Role::Client))
            .await
            .unwrap();
        f.users
            .set_status(user.id, UserStatus::Activated)
            .await
            .unwrap();
        grant_window(&f, user.id, 0, 30).await;

        let auth = f.service.login(login_input("lab@example.com")).await.unwrap();
        assert!(auth.success);
        assert_eq!(auth.user.id, user.id);

        // First rotation works, replaying the same token does not
        let rotated = f.service.refresh(&auth.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, auth.refresh_token);

        let err = f.service.refresh(&auth.refresh_token).await.unwrap_err();
        assert!(matches!(err, UserError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_subscription_flips_both_records_then_gates_on_status() {
        let f = fixture();
        let user = f
            .service
            .register(register_input("lab@example.com", Role::Supplier))
            .await
            .unwrap();
        f.users
            .set_status(user.id, UserStatus::Activated)
            .await
            .unwrap();
        grant_window(&f, user.id, 60, 30).await;

        // First attempt observes the stale window
        let err = f
            .service
            .login(login_input("lab@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::SubscriptionExpired));

        // Side effects landed on both records
        let subscription = f
            .subscriptions
            .latest_for_user(user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Expired);
        let stored = f.users.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.status, UserStatus::NotActivated);

        // Second attempt is now stopped by the account status
        let err = f
            .service
            .login(login_input("lab@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::AccountNotActivated));
    }

    #[tokio::test]
    async fn admin_bypasses_the_subscription_gate() {
        let f = fixture();
        // Admins are provisioned out of band, never via register()
        let admin = User::new(
            RegisterUser {
                name: "Ops".to_string(),
                email: "ops@example.com".to_string(),
                password: "unused".to_string(),
                role: Role::Admin,
                labo_type: None,
            },
            hash_password("Str0ngPass!").unwrap(),
        );
        f.users.create(admin).await.unwrap();

        let auth = f.service.login(login_input("ops@example.com")).await.unwrap();
        assert_eq!(auth.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn password_reset_round_trip() {
        let f = fixture();
        f.service
            .register(register_input("lab@example.com", Role::Client))
            .await
            .unwrap();

        // Unknown email still reports success
        f.service
            .request_password_reset("nobody@example.com")
            .await
            .unwrap();

        f.service
            .request_password_reset("lab@example.com")
            .await
            .unwrap();

        // A made-up token never matches a stored one
        let err = f
            .service
            .reset_password("not-a-real-token", "NewPassw0rd!")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidToken));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let f = fixture();
        let user = f
            .service
            .register(register_input("lab@example.com", Role::Client))
            .await
            .unwrap();

        let err = f
            .service
            .change_password(user.id, "wrong", "NewPassw0rd!")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));

        f.service
            .change_password(user.id, "Str0ngPass!", "NewPassw0rd!")
            .await
            .unwrap();
        let stored = f.users.get_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password("NewPassw0rd!", &stored.password_hash).unwrap());
    }
}
