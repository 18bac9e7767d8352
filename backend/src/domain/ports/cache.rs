//! Cache port.
//!
//! A string-keyed, string-valued cache with TTLs, pattern scans, and the
//! counter operations the rate limiter needs. Callers treat every failure
//! as a miss except where a flow explicitly depends on the cache (pending
//! registrations).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::Error as DomainError;

/// Failure raised by the cache backend.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend failed: {0}")]
    Backend(String),
}

impl CacheError {
    /// Build a [`CacheError::Backend`].
    pub fn backend(detail: impl Into<String>) -> Self {
        Self::Backend(detail.into())
    }
}

impl From<CacheError> for DomainError {
    fn from(err: CacheError) -> Self {
        let CacheError::Backend(detail) = err;
        Self::upstream(format!("Cache unavailable: {detail}"))
    }
}

/// Key-value cache with expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    /// Delete the given keys. Missing keys are not an error.
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;
    /// All keys matching a glob-style pattern.
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
    /// Increment a counter key, returning the new value.
    async fn increment(&self, key: &str) -> Result<i64, CacheError>;
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError>;
    /// Remaining lifetime of a key, if it exists and has an expiry.
    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, CacheError>;
}
