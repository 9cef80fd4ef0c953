//! Problems Domain
//!
//! Support tickets. Any authenticated user can report a problem; every admin
//! gets a durable notification and the `admins` realtime room sees a
//! `newProblem` event the moment it lands.

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{ProblemError, ProblemResult};
pub use handlers::ApiDoc;
pub use models::{CreateProblem, Problem, ProblemStatus};
pub use mongodb::MongoProblemRepository;
pub use repository::{InMemoryProblemRepository, ProblemRepository};
pub use service::ProblemService;
