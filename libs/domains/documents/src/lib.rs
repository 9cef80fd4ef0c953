//! Documents Domain ("papiers")
//!
//! Proof-of-identity paperwork gating account activation. Each user submits
//! exactly one bundle: a single identity document for clients, three
//! documents for suppliers. Admins review bundles and approving one
//! activates the owning account.

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{DocumentError, DocumentResult};
pub use handlers::ApiDoc;
pub use models::{BundleStatus, DocumentBundle};
pub use mongodb::MongoDocumentRepository;
pub use repository::{DocumentRepository, InMemoryDocumentRepository};
pub use service::DocumentService;
