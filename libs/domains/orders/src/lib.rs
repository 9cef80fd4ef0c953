//! Orders Domain
//!
//! Client purchases of laboratory equipment. Every order targets exactly one
//! supplier; creation snapshots product names and prices into order lines and
//! consumes stock atomically, rolling back already-consumed lines when a later
//! line cannot be covered. Delivery progresses through a strict one-way status
//! machine driven by the owning supplier.
//!
//! ```text
//! en cours ──► on route ──► arrived
//! ```
//!
//! Status changes and new orders are recorded as durable notifications and
//! pushed over the realtime hub.

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{OrderError, OrderResult};
pub use handlers::ApiDoc;
pub use models::{CreateOrder, CreateOrderLine, Order, OrderLine, OrderStatus, UpdateOrderStatus};
pub use mongodb::MongoOrderRepository;
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
