//! Redis-backed [`CacheOperations`] implementation.

use crate::error::{CacheError, CacheResult};
use crate::metrics::CacheMetrics;
use crate::CacheOperations;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Shared Redis connection manager, cloned cheaply across handlers.
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

#[derive(Clone)]
pub struct RedisCacheService {
    redis: SharedRedis,
    metrics: CacheMetrics,
}

impl RedisCacheService {
    pub fn new(redis: SharedRedis) -> Self {
        Self {
            redis,
            metrics: CacheMetrics::new(),
        }
    }

    pub fn with_metrics(redis: SharedRedis, metrics: CacheMetrics) -> Self {
        Self { redis, metrics }
    }
}

#[async_trait::async_trait]
impl CacheOperations for RedisCacheService {
    async fn cache_data<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        let data = serde_json::to_string(value).map_err(CacheError::Serialization)?;
        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(key, data, ttl.as_secs())
            .await
            .map_err(|e| {
                self.metrics.record_error(key, "redis");
                CacheError::Redis(e)
            })?;

        debug!(key = %key, ttl_secs = ttl.as_secs(), "cache set");
        self.metrics.record_write(key);
        Ok(())
    }

    async fn get_cached<T: DeserializeOwned + Send>(&self, key: &str) -> CacheResult<T> {
        let mut conn = self.redis.lock().await;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    debug!(key = %key, "cache hit");
                    self.metrics.record_hit(key);
                    Ok(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "cache deserialization failed, evicting");
                    self.metrics.record_error(key, "deserialize");
                    let _ = conn.del::<_, ()>(key).await;
                    Err(CacheError::KeyNotFound)
                }
            },
            Ok(None) => {
                debug!(key = %key, "cache miss");
                self.metrics.record_miss(key);
                Err(CacheError::KeyNotFound)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "redis get error");
                self.metrics.record_error(key, "redis");
                Err(CacheError::Redis(e))
            }
        }
    }

    async fn invalidate_key(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        conn.del::<_, ()>(key).await.map_err(CacheError::Redis)?;
        self.metrics.record_invalidation(key);
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> CacheResult<usize> {
        let mut conn = self.redis.lock().await;
        let mut cursor: u64 = 0;
        let mut total_deleted = 0usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut *conn)
                .await
                .map_err(CacheError::Redis)?;

            if !keys.is_empty() {
                let mut pipe = Pipeline::new();
                for key in &keys {
                    pipe.del(key);
                }
                pipe.query_async::<_, ()>(&mut *conn)
                    .await
                    .map_err(CacheError::Redis)?;
                total_deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted = total_deleted, "cache pattern invalidation");
        self.metrics.record_invalidation(pattern);
        Ok(total_deleted)
    }
}
