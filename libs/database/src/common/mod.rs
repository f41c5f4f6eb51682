//! Shared error and retry helpers.

pub mod error;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryConfig, retry, retry_with_backoff};

#[cfg(feature = "postgres")]
pub use error::is_unique_violation;
