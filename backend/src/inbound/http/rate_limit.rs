//! Cache-backed fixed-window rate limiter.
//!
//! Fails open: when the cache is unreachable the request proceeds, because
//! throttling is protection for downstream services, not a correctness
//! requirement.

use std::sync::Arc;

use tracing::warn;

use crate::domain::cache_keys::{self, RATE_LIMIT_WINDOW};
use crate::domain::ports::KeyValueCache;
use crate::domain::Error;

/// Maximum requests per scope per window.
const MAX_REQUESTS: i64 = 5;

/// Fixed-window counter over the cache.
#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<dyn KeyValueCache>,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
        Self { cache }
    }

    /// Record a hit against `scope` and reject once the window is full.
    pub async fn check(&self, scope: &str) -> Result<(), Error> {
        let key = cache_keys::rate_limit(scope);
        let count = match self.cache.increment(&key).await {
            Ok(count) => count,
            Err(err) => {
                warn!(key, error = %err, "rate limiter unavailable; allowing request");
                return Ok(());
            }
        };

        if count == 1 {
            if let Err(err) = self.cache.expire(&key, RATE_LIMIT_WINDOW).await {
                warn!(key, error = %err, "could not set rate-limit window");
            }
        }

        if count > MAX_REQUESTS {
            let retry_after = match self.cache.time_to_live(&key).await {
                Ok(Some(ttl)) => ttl.as_secs(),
                _ => RATE_LIMIT_WINDOW.as_secs(),
            };
            return Err(Error::rate_limited(format!(
                "Too many requests. Try again after {retry_after} seconds."
            )));
        }
        Ok(())
    }
}
