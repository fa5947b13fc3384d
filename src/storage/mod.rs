//! Credential storage and login throttling.
//!
//! The auth core only ever reads credentials. Redis is the production backend;
//! an immutable in-memory store covers tests and tooling.

pub mod credential;
pub mod memory;
pub mod throttle;

use crate::models::AdminCredential;
use async_trait::async_trait;

pub use credential::RedisCredentialStore;
pub use memory::MemoryCredentialStore;
pub use throttle::{AttemptLimiter, RedisAttemptLimiter};

/// Failure of the persistence collaborator.
///
/// Never an authentication failure: callers surface it as a 5xx.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(format!("Redis error: {}", err))
    }
}

/// Read-only lookup of administrator credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AdminCredential>, StoreError>;
}
