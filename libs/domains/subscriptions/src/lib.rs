//! Subscriptions Domain
//!
//! Admin-managed access windows for clients and suppliers. A user's most
//! recent subscription decides whether they may log in at all: the login flow
//! looks it up, and an expired window is flipped to `expired` on the spot as
//! a side effect of the attempt.

pub mod activation;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use activation::{AccountActivator, NullActivator};
pub use error::{SubscriptionError, SubscriptionResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateSubscription, CurrentSubscription, Subscription, SubscriptionStatus, UpdateSubscription,
};
pub use mongodb::MongoSubscriptionRepository;
pub use repository::{InMemorySubscriptionRepository, SubscriptionRepository};
pub use service::SubscriptionService;
