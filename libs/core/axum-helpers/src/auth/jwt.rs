use chrono::{Duration, Utc};
use core_config::JwtConfig;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// JWT token time-to-live constants
pub const ACCESS_TOKEN_TTL: i64 = 900; // 15 minutes
pub const REFRESH_TOKEN_TTL: i64 = 604800; // 7 days

/// Marketplace account role.
///
/// Serialized in lowercase on the wire (`"client"`, `"supplier"`, `"admin"`),
/// both inside JWT claims and in user documents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Client,
    Supplier,
    Admin,
}

impl Role {
    /// Roles whose login is gated by account activation and subscription state.
    pub fn requires_subscription(&self) -> bool {
        matches!(self, Role::Client | Role::Supplier)
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,   // Subject (user ID)
    pub email: String, // User email
    pub name: String,  // User name
    pub role: Role,    // Account role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labo_type: Option<String>, // Laboratory type (clients only)
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
    pub jti: String,   // JWT ID (persisted for refresh-token rotation)
}

impl JwtClaims {
    /// Parse the subject back into the user id.
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Identity snapshot used when minting tokens.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub labo_type: Option<String>,
}

/// Stateless JWT authentication.
///
/// Access tokens are verified purely by signature and expiry; refresh tokens
/// additionally have their `jti` checked against the persisted rotation store
/// by the users domain.
#[derive(Clone)]
pub struct JwtAuth {
    secret: String,
}

impl JwtAuth {
    /// Create a new JWT auth instance.
    ///
    /// # Example
    /// ```ignore
    /// use axum_helpers::JwtAuth;
    /// use core_config::{FromEnv, JwtConfig};
    ///
    /// let config = JwtConfig::from_env()?;
    /// let jwt_auth = JwtAuth::new(&config);
    /// ```
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!("JWT auth initialized");
        Self {
            secret: config.secret.clone(),
        }
    }

    /// Create access token (15 min)
    pub fn create_access_token(&self, subject: &TokenSubject) -> eyre::Result<String> {
        self.create_token(subject, ACCESS_TOKEN_TTL)
    }

    /// Create refresh token (7 days)
    pub fn create_refresh_token(&self, subject: &TokenSubject) -> eyre::Result<String> {
        self.create_token(subject, REFRESH_TOKEN_TTL)
    }

    /// Create JWT token with specified TTL
    fn create_token(&self, subject: &TokenSubject, ttl_seconds: i64) -> eyre::Result<String> {
        let now = Utc::now();
        let exp = (now + Duration::seconds(ttl_seconds)).timestamp();
        let iat = now.timestamp();
        let jti = Uuid::new_v4().to_string();

        let claims = JwtClaims {
            sub: subject.user_id.to_string(),
            email: subject.email.clone(),
            name: subject.name.clone(),
            role: subject.role,
            labo_type: subject.labo_type.clone(),
            exp,
            iat,
            jti,
        };

        let header = Header {
            alg: jsonwebtoken::Algorithm::HS256,
            ..Default::default()
        };

        let token = encode(
            &header,
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify JWT token signature and decode claims
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("unit-test-secret-key-of-32-chars!!"))
    }

    fn client_subject() -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            email: "client@lab.example".to_string(),
            name: "Lab Client".to_string(),
            role: Role::Client,
            labo_type: Some("biochimie".to_string()),
        }
    }

    #[test]
    fn round_trip_access_token() {
        let auth = test_auth();
        let subject = client_subject();

        let token = auth.create_access_token(&subject).unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.sub, subject.user_id.to_string());
        assert_eq!(claims.email, subject.email);
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.labo_type.as_deref(), Some("biochimie"));
        assert_eq!(claims.user_id().unwrap(), subject.user_id);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let auth = test_auth();
        let other = JwtAuth::new(&JwtConfig::new("another-secret-key-of-32-chars!!!"));

        let token = other.create_access_token(&client_subject()).unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn refresh_token_outlives_access_token() {
        let auth = test_auth();
        let subject = client_subject();

        let access = auth
            .verify_token(&auth.create_access_token(&subject).unwrap())
            .unwrap();
        let refresh = auth
            .verify_token(&auth.create_refresh_token(&subject).unwrap())
            .unwrap();

        assert!(refresh.exp > access.exp);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn role_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Supplier).unwrap(), "\"supplier\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
        assert_eq!(Role::Client.to_string(), "client");
    }

    #[test]
    fn subscription_gate_applies_to_client_and_supplier() {
        assert!(Role::Client.requires_subscription());
        assert!(Role::Supplier.requires_subscription());
        assert!(!Role::Admin.requires_subscription());
    }
}
