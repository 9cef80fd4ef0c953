//! Users Domain
//!
//! Accounts, authentication, and the login gate:
//! - Registration for clients and suppliers (accounts start deactivated and
//!   wait for admin approval)
//! - Password hashing with Argon2
//! - JWT access/refresh pairs with persisted `jti` rotation
//! - Login-time subscription gate: an expired window flips both the
//!   subscription and the account status as a side effect of the attempt
//! - Password reset over a mailer seam
//! - Admin account management (listing, activation, removal)

pub mod auth_handlers;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use auth_handlers::AuthApiDoc;
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use mailer::{LogMailer, Mailer};
pub use models::{
    AuthResponse, LoginRequest, RegisterUser, UpdateProfile, User, UserFilter, UserResponse,
    UserStatus,
};
pub use mongodb::{MongoTokenStore, MongoUserRepository};
pub use repository::{InMemoryTokenStore, InMemoryUserRepository, TokenStore, UserRepository};
pub use service::UserService;
