//! Authentication and authorization module.
//!
//! This module provides:
//! - Stateless JWT token creation and verification
//! - Typed role claims shared by every domain crate
//! - Authentication and role-policy middleware for protected routes
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::auth::{jwt_auth_middleware, require_role, JwtAuth, Role};
//! use core_config::{FromEnv, JwtConfig};
//!
//! let config = JwtConfig::from_env()?;
//! let auth = JwtAuth::new(&config);
//!
//! // Protect routes with JWT middleware plus a single role policy
//! let protected = Router::new()
//!     .route("/commandes", post(create_order))
//!     .layer(axum::middleware::from_fn_with_state(Role::Client, require_role))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod jwt;
pub mod middleware;

// Re-export commonly used types
pub use jwt::{JwtAuth, JwtClaims, Role, TokenSubject, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL};
pub use middleware::{
    jwt_auth_middleware, optional_jwt_auth_middleware, require_role, CurrentUser,
};
