use mongodb::{options::ClientOptions, Client};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;
use crate::common::{retry, retry_with_backoff, BackoffPolicy};

/// Error type for MongoDB connection operations
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Connect to MongoDB and return a Client
///
/// # Example
/// ```ignore
/// use database::mongodb::connect;
///
/// let client = connect("mongodb://localhost:27017").await?;
/// let db = client.database("marketplace");
/// ```
pub async fn connect(url: &str) -> Result<Client, MongoError> {
    connect_from_config(&MongoConfig::new(url)).await
}

/// Connect using a [`MongoConfig`]
///
/// Verifies the connection with a lightweight command before returning.
///
/// # Example
/// ```ignore
/// use core_config::FromEnv;
/// use database::mongodb::{connect_from_config, MongoConfig};
///
/// let config = MongoConfig::from_env()?;
/// let client = connect_from_config(&config).await?;
/// ```
pub async fn connect_from_config(config: &MongoConfig) -> Result<Client, MongoError> {
    info!("Attempting to connect to MongoDB at {}", config.url);

    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;

    // Verify connection by listing databases (lightweight ping)
    client
        .list_database_names()
        .await
        .map_err(|e| MongoError::ConnectionFailed(e.to_string()))?;

    info!("Successfully connected to MongoDB");
    Ok(client)
}

/// Connect to MongoDB, retrying transient startup failures
///
/// Backoff is jittered so a fleet of restarting services does not hammer
/// the database in lockstep.
pub async fn connect_with_retry(
    url: &str,
    policy: Option<BackoffPolicy>,
) -> Result<Client, MongoError> {
    let url = url.to_string();

    match policy {
        Some(policy) => retry_with_backoff(|| connect(&url), policy).await,
        None => retry(|| connect(&url)).await,
    }
}

/// Connect from a [`MongoConfig`], retrying transient startup failures
///
/// # Example
/// ```ignore
/// use database::common::BackoffPolicy;
/// use database::mongodb::{connect_from_config_with_retry, MongoConfig};
///
/// let config = MongoConfig::from_env()?;
/// let policy = BackoffPolicy::new().with_max_retries(5);
/// let client = connect_from_config_with_retry(&config, Some(policy)).await?;
/// ```
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    policy: Option<BackoffPolicy>,
) -> Result<Client, MongoError> {
    let config = config.clone();

    match policy {
        Some(policy) => retry_with_backoff(|| connect_from_config(&config), policy).await,
        None => retry(|| connect_from_config(&config)).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn connects_to_local_mongodb() {
        let client = connect("mongodb://localhost:27017").await;
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn rejects_malformed_url() {
        let result = connect("not-a-mongodb-url").await;
        assert!(result.is_err());
    }
}
