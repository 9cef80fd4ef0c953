//! Notifications Domain
//!
//! Durable per-user notifications. Order and support-ticket workflows record
//! notifications here; users read them back newest-first (capped at 50) and
//! acknowledge them individually or all at once. Realtime delivery is a
//! separate concern handled by the websocket hub.

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{NotificationError, NotificationResult};
pub use handlers::ApiDoc;
pub use models::{Notification, NotificationKind};
pub use mongodb::MongoNotificationRepository;
pub use repository::{InMemoryNotificationRepository, NotificationRepository};
pub use service::NotificationService;
