use axum_helpers::auth::{Role, TokenSubject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Account activation state.
///
/// Accounts start deactivated and are switched on by an admin (directly or by
/// approving the user's document bundle). An expired subscription observed at
/// login flips the account back to `NotActivated`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserStatus {
    Activated,
    NotActivated,
}

/// User entity.
///
/// The password hash is stored with the document; API output always goes
/// through [`UserResponse`], which omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Display name (person or laboratory)
    pub name: String,
    /// Login email, stored lowercase and unique
    pub email: String,
    /// Argon2 password hash
    pub password_hash: String,
    pub role: Role,
    /// Laboratory specialty, clients only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labo_type: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new deactivated account. The password must already be hashed.
    pub fn new(input: RegisterUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            email: input.email.to_lowercase(),
            password_hash,
            role: input.role,
            labo_type: input.labo_type,
            status: UserStatus::NotActivated,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_activated(&self) -> bool {
        self.status == UserStatus::Activated
    }

    /// Identity snapshot for token minting.
    pub fn token_subject(&self) -> TokenSubject {
        TokenSubject {
            user_id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            labo_type: self.labo_type.clone(),
        }
    }
}

/// User DTO returned by the API, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labo_type: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            labo_type: user.labo_type,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for registering a new client or supplier account
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Role,
    #[validate(length(max = 100))]
    pub labo_type: Option<String>,
}

/// DTO for logging in
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Token pair and user snapshot returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

/// DTO for rotating a refresh token
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// DTO for self-service profile edits
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub labo_type: Option<String>,
}

/// DTO for changing the password while logged in
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// DTO for asking for a password reset email
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RequestPasswordReset {
    #[validate(email)]
    pub email: String,
}

/// DTO for completing a password reset
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPassword {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// DTO for admin status changes
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserStatus {
    pub status: UserStatus,
}

/// Query filters for admin user listing
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    /// Search in name and email
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> i64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_input(role: Role) -> RegisterUser {
        RegisterUser {
            name: "Labo Curie".to_string(),
            email: "Contact@Labo-Curie.example".to_string(),
            password: "Str0ngPass!".to_string(),
            role,
            labo_type: Some("biochimie".to_string()),
        }
    }

    #[test]
    fn new_account_is_deactivated_with_lowercase_email() {
        let user = User::new(register_input(Role::Client), "hash".to_string());

        assert_eq!(user.status, UserStatus::NotActivated);
        assert!(!user.is_activated());
        assert_eq!(user.email, "contact@labo-curie.example");
    }

    #[test]
    fn response_omits_password_hash() {
        let user = User::new(register_input(Role::Supplier), "hash".to_string());
        let response: UserResponse = user.into();

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "supplier");
        assert_eq!(json["status"], "not_activated");
    }

    #[test]
    fn token_subject_carries_identity() {
        let user = User::new(register_input(Role::Client), "hash".to_string());
        let subject = user.token_subject();

        assert_eq!(subject.user_id, user.id);
        assert_eq!(subject.labo_type.as_deref(), Some("biochimie"));
    }
}
