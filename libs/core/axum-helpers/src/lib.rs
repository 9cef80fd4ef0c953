//! # Axum Helpers
//!
//! A collection of utilities, middleware, and helpers for building Axum web applications.
//!
//! ## Modules
//!
//! - **[`auth`]**: JWT authentication, role policy middleware, identity extractors
//! - **[`server`]**: Server setup, health checks, graceful shutdown
//! - **[`http`]**: HTTP middleware (CORS, security headers)
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: Custom extractors (UUID path, validated JSON)
//! - **[`uploads`]**: Multipart file upload policies and storage
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_production_app, create_router};
//! use core_config::server::ServerConfig;
//! use std::time::Duration;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes).await?;
//!
//!     let config = ServerConfig::default();
//!     create_production_app(router, &config, Duration::from_secs(30), async {}).await?;
//!     Ok(())
//! }
//! ```

// Domain modules
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;
pub mod uploads;

// Re-export auth types
pub use auth::{
    jwt_auth_middleware, optional_jwt_auth_middleware, require_role, CurrentUser, JwtAuth,
    JwtClaims, Role, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL,
};

// Re-export server types
pub use server::{
    create_production_app, create_router, health_router, HealthResponse, ShutdownCoordinator,
};

// Re-export HTTP middleware
pub use http::security_headers;

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorResponse};

// Re-export extractors
pub use extractors::{UuidPath, ValidatedJson};

// Re-export upload helpers
pub use uploads::{
    StoredFile, UploadPolicy, DOCUMENT_UPLOAD, PAYMENT_PROOF_UPLOAD, PRODUCT_MEDIA_UPLOAD,
};
