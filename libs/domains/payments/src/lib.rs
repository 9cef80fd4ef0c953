//! Payments Domain
//!
//! Proof-of-payment records for orders. Each order carries at most one
//! payment; the declared amount must match the order total to the cent, and
//! the buyer attaches a proof document (bank transfer receipt or similar)
//! that admins review out of band.

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{PaymentError, PaymentResult};
pub use handlers::{ApiDoc, CaptureApiDoc};
pub use models::{CreatePayment, Payment};
pub use mongodb::MongoPaymentRepository;
pub use repository::{InMemoryPaymentRepository, PaymentRepository};
pub use service::PaymentService;
