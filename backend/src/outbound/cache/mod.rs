//! Redis cache adapter.
//!
//! Implements the `KeyValueCache` port over a `bb8-redis` pool. Pattern
//! scans use cursored SCAN rather than KEYS so invalidation never blocks
//! the server.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::bb8::Pool;
use bb8_redis::redis;
use bb8_redis::RedisConnectionManager;

use crate::domain::ports::{CacheError, KeyValueCache};

/// Redis-backed implementation of the `KeyValueCache` port.
#[derive(Clone)]
pub struct RedisKeyValueCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisKeyValueCache {
    /// Build the cache pool against the given Redis URL.
    pub async fn connect(
        url: &str,
        max_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self, CacheError> {
        let manager = RedisConnectionManager::new(url)
            .map_err(|err| CacheError::backend(format!("invalid redis url: {err}")))?;
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_timeout(connection_timeout)
            .build(manager)
            .await
            .map_err(|err| CacheError::backend(format!("could not build redis pool: {err}")))?;
        Ok(Self { pool })
    }

    async fn conn(
        &self,
    ) -> Result<bb8_redis::bb8::PooledConnection<'_, RedisConnectionManager>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| CacheError::backend(format!("redis checkout failed: {err}")))
    }
}

fn map_redis(err: redis::RedisError) -> CacheError {
    CacheError::backend(err.to_string())
}

#[async_trait]
impl KeyValueCache for RedisKeyValueCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        let () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut *conn)
            .await
            .map_err(map_redis)?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key);
        }
        let _removed: i64 = cmd.query_async(&mut *conn).await.map_err(map_redis)?;
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn().await?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await
                .map_err(map_redis)?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(keys)
    }

    async fn increment(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.conn().await?;
        let count: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis)?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        let _set: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs().max(1))
            .query_async(&mut *conn)
            .await
            .map_err(map_redis)?;
        Ok(())
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let mut conn = self.conn().await?;
        let ttl: i64 = redis::cmd("TTL")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(map_redis)?;
        // -1 means no expiry, -2 means no such key.
        if ttl < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(u64::try_from(ttl).unwrap_or(0))))
        }
    }
}
