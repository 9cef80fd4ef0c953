//! Stats Domain
//!
//! Admin dashboard figures. Every request recomputes the aggregates from the
//! orders and users collections; nothing is materialized or cached.

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{StatsError, StatsResult};
pub use handlers::ApiDoc;
pub use models::{Dashboard, MonthlyRevenue, StatusCount, TopProduct, TopSupplier, UserCounts};
pub use mongodb::MongoStatsRepository;
pub use repository::StatsRepository;
pub use service::StatsService;
