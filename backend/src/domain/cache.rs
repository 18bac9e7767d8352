//! Read-through caching and keyed invalidation.
//!
//! The cache is an accelerator, never an authority: on any cache failure a
//! read falls through to the loader and a mutation proceeds with its
//! invalidation logged and dropped. The one exception — pending
//! registrations, which live only in the cache — talks to the
//! [`KeyValueCache`] port directly rather than through this policy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::cache_keys;
use super::error::Error;
use super::ids::{CourseId, UserId};
use super::ports::KeyValueCache;

/// Read-through and invalidation policy over the cache port.
#[derive(Clone)]
pub struct CachePolicy {
    cache: Arc<dyn KeyValueCache>,
}

impl CachePolicy {
    /// Wrap a cache backend.
    pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
        Self { cache }
    }

    /// Serve `key` from the cache, or run `load` and store its result.
    ///
    /// Cache failures on either side degrade to a plain load; only the
    /// loader's own error propagates.
    pub async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(key, error = %err, "discarding undecodable cache entry");
                    self.delete_best_effort(std::slice::from_ref(&key.to_owned()))
                        .await;
                }
            },
            Ok(None) => {}
            Err(err) => warn!(key, error = %err, "cache read failed; loading from source"),
        }

        let value = load().await?;
        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(err) = self.cache.set(key, &raw, ttl).await {
                    warn!(key, error = %err, "cache write failed; serving uncached");
                }
            }
            Err(err) => warn!(key, error = %err, "could not serialise value for caching"),
        }
        Ok(value)
    }

    /// Drop every key family a course mutation can have gone stale:
    /// the public listing, the instructor's listing, and the detail entry.
    pub async fn after_course_mutation(&self, course: CourseId, instructor: UserId) {
        self.delete_pattern(&cache_keys::course_list_pattern()).await;
        self.delete_pattern(&cache_keys::instructor_courses_pattern(instructor))
            .await;
        self.delete_pattern(&cache_keys::course_detail_pattern(course))
            .await;
    }

    /// Drop everything an enrolment change invalidates: the student's
    /// course pages and enrolment list, and the course's count and detail.
    pub async fn after_enrollment_change(&self, student: UserId, course: CourseId) {
        self.delete_pattern(&cache_keys::student_courses_pattern(student))
            .await;
        self.delete_pattern(&cache_keys::course_detail_pattern(course))
            .await;
        self.delete_best_effort(&[
            cache_keys::student_enrollments(student),
            cache_keys::enrollment_count(course),
        ])
        .await;
    }

    /// Drop a user's cached profile after roles or details change.
    pub async fn after_profile_change(&self, user: UserId) {
        self.delete_best_effort(&[cache_keys::user_profile(user)]).await;
    }

    async fn delete_pattern(&self, pattern: &str) {
        let keys = match self.cache.keys_matching(pattern).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(pattern, error = %err, "cache scan failed; skipping invalidation");
                return;
            }
        };
        if !keys.is_empty() {
            self.delete_best_effort(&keys).await;
        }
    }

    async fn delete_best_effort(&self, keys: &[String]) {
        if let Err(err) = self.cache.delete(keys).await {
            warn!(?keys, error = %err, "cache delete failed; entries will expire by TTL");
        }
    }
}
