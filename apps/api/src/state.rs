//! Shared application state.
//!
//! Cloned per handler (inexpensive Arc clones underneath). Repositories and
//! services are wired in `api::routes`; the state carries what outlives them:
//! configuration, the MongoDB handles, and the realtime hub.

use mongodb::{Client, Database};
use realtime::Hub;

#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    /// MongoDB database instance
    pub db: Database,
    /// Broadcast hub behind the websocket channel
    pub hub: Hub,
}
