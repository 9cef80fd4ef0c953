//! Utilities shared by the database connectors.

pub mod retry;

pub use retry::{retry, retry_with_backoff, BackoffPolicy};
