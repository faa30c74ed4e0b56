//! Tagged cache fronting list, search, and cursor responses.
//!
//! Single-entity reads never go through here; they hit the repository
//! directly, trading a small latency cost for strong consistency right
//! after a write. On the disabled path every call degrades to a cache
//! miss after exactly one branch, so the hot path never pays for a
//! feature flag twice.

use crate::error::{AppError, Result};
use serde::{de::DeserializeOwned, Serialize};
use social_cache::{CacheError, CacheOperations, MemoryCacheService, RedisCacheService, SharedRedis};
use std::collections::BTreeMap;
use std::time::Duration;

enum Backend {
    Redis(RedisCacheService),
    Memory(MemoryCacheService),
}

pub struct ContentCache {
    backend: Option<Backend>,
    query_ttl: Duration,
    cursor_ttl: Duration,
    search_ttl: Duration,
}

impl ContentCache {
    pub fn redis(redis: SharedRedis) -> Self {
        Self {
            backend: Some(Backend::Redis(RedisCacheService::new(redis))),
            query_ttl: Duration::from_secs(social_cache::ttl::QUERY),
            cursor_ttl: Duration::from_secs(social_cache::ttl::CURSOR),
            search_ttl: Duration::from_secs(social_cache::ttl::SEARCH),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: Some(Backend::Memory(MemoryCacheService::new())),
            query_ttl: Duration::from_secs(social_cache::ttl::QUERY),
            cursor_ttl: Duration::from_secs(social_cache::ttl::CURSOR),
            search_ttl: Duration::from_secs(social_cache::ttl::SEARCH),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            query_ttl: Duration::from_secs(social_cache::ttl::QUERY),
            cursor_ttl: Duration::from_secs(social_cache::ttl::CURSOR),
            search_ttl: Duration::from_secs(social_cache::ttl::SEARCH),
        }
    }

    pub fn query_key(&self, params: &BTreeMap<String, String>) -> String {
        social_cache::generate_hash_key("query", params)
    }

    pub fn cursor_key(&self, params: &BTreeMap<String, String>) -> String {
        social_cache::generate_hash_key("cursor", params)
    }

    pub fn search_key(&self, params: &BTreeMap<String, String>) -> String {
        social_cache::generate_hash_key("search", params)
    }

    pub fn query_ttl(&self) -> Duration {
        self.query_ttl
    }

    pub fn cursor_ttl(&self) -> Duration {
        self.cursor_ttl
    }

    pub fn search_ttl(&self) -> Duration {
        self.search_ttl
    }

    pub async fn cache_data<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        match &self.backend {
            None => Err(AppError::CacheError("cache disabled".to_string())),
            Some(Backend::Redis(c)) => c
                .cache_data(key, value, ttl)
                .await
                .map_err(map_cache_error),
            Some(Backend::Memory(c)) => c
                .cache_data(key, value, ttl)
                .await
                .map_err(map_cache_error),
        }
    }

    /// Returns `Ok(None)` on cache miss or a disabled cache — the caller
    /// always treats the two identically.
    pub async fn get_cached<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        let result = match &self.backend {
            None => return Ok(None),
            Some(Backend::Redis(c)) => c.get_cached(key).await,
            Some(Backend::Memory(c)) => c.get_cached(key).await,
        };

        match result {
            Ok(value) => Ok(Some(value)),
            Err(CacheError::KeyNotFound) => Ok(None),
            Err(e) => Err(map_cache_error(e)),
        }
    }

    pub async fn invalidate_key(&self, key: &str) {
        let result = match &self.backend {
            None => return,
            Some(Backend::Redis(c)) => c.invalidate_key(key).await,
            Some(Backend::Memory(c)) => c.invalidate_key(key).await,
        };
        if let Err(e) = result {
            tracing::debug!(key = %key, error = %e, "cache invalidation failed");
        }
    }

    pub async fn invalidate_pattern(&self, pattern: &str) {
        let result = match &self.backend {
            None => return,
            Some(Backend::Redis(c)) => c.invalidate_pattern(pattern).await,
            Some(Backend::Memory(c)) => c.invalidate_pattern(pattern).await,
        };
        if let Err(e) = result {
            tracing::debug!(pattern = %pattern, error = %e, "cache pattern invalidation failed");
        }
    }

    /// Invalidation on any post write by `user_id`, per the coherence
    /// policy: user-scoped cursor/search entries plus a blanket sweep of
    /// offset-paged queries, which aren't user-scoped by default.
    pub async fn invalidate_for_post_write(&self, user_id: uuid::Uuid) {
        self.invalidate_pattern(&format!("cursor:*userId:{user_id}*")).await;
        self.invalidate_pattern(&format!("search:*userId:{user_id}*")).await;
        self.invalidate_pattern("query:*").await;
    }

    /// Comment and vote writes embed `commentCounter`/`score` in cached
    /// post lists, so every list namespace is invalidated blanket-wide.
    pub async fn invalidate_for_counter_write(&self) {
        self.invalidate_pattern("cursor:*").await;
        self.invalidate_pattern("search:*").await;
        self.invalidate_pattern("query:*").await;
    }
}

fn map_cache_error(e: CacheError) -> AppError {
    match e {
        CacheError::CacheDisabled | CacheError::KeyNotFound => {
            AppError::CacheError(e.to_string())
        }
        other => AppError::CacheError(other.to_string()),
    }
}
