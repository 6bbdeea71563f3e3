//! Key-value store for short-lived auth state (sessions, reset tokens).

use async_trait::async_trait;
use std::time::Duration;

/// String key-value store with optional expiry.
///
/// Reads are best-effort: a backend failure on `get` is reported as a miss,
/// which for sessions means "not logged in".
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
