//! MongoDB connection management for the marketplace services.
//!
//! Provides configuration loading, connection establishment with retry,
//! and health checks. Collection-level access lives in the domain crates;
//! this crate only hands out a verified [`mongodb::Client`].
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::mongodb::{connect_from_config_with_retry, MongoConfig};
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;
pub mod mongodb;

pub use common::{retry, retry_with_backoff, BackoffPolicy};
pub use mongodb::{MongoConfig, MongoError};
