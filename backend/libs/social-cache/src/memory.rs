//! In-process [`CacheOperations`] implementation.
//!
//! Used in tests and in deployments that run without Redis. Entries carry
//! an absolute expiry instant; reads evict lazily on access so there is no
//! background sweep thread to keep alive.

use crate::error::{CacheError, CacheResult};
use crate::CacheOperations;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    data: String,
    expires_at: Instant,
}

/// Point-in-time counters for a [`MemoryCacheService`].
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct Stats {
    pub keys: usize,
    pub hits: u64,
    pub misses: u64,
    pub memory_usage: usize,
}

pub struct MemoryCacheService {
    entries: Mutex<HashMap<String, Entry>>,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
}

impl Default for MemoryCacheService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCacheService {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: std::sync::atomic::AtomicU64::new(0),
            misses: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Drops every entry whose expiry has passed. Cheap enough to call on
    /// every read/write; a real sweep thread isn't warranted at this scale.
    fn evict_expired(&self, entries: &mut HashMap<String, Entry>) {
        let now = Instant::now();
        entries.retain(|_, e| e.expires_at > now);
    }

    pub fn stats(&self) -> Stats {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        self.evict_expired(&mut entries);
        let memory_usage = entries
            .iter()
            .map(|(k, v)| k.len() + v.data.len())
            .sum();
        Stats {
            keys: entries.len(),
            hits: self.hits.load(std::sync::atomic::Ordering::Relaxed),
            misses: self.misses.load(std::sync::atomic::Ordering::Relaxed),
            memory_usage,
        }
    }

    fn matches_pattern(key: &str, pattern: &str) -> bool {
        if !pattern.contains('*') {
            return key == pattern;
        }
        let parts: Vec<&str> = pattern.split('*').collect();
        let mut rest = key;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if i == 0 {
                if !rest.starts_with(part) {
                    return false;
                }
                rest = &rest[part.len()..];
            } else if i == parts.len() - 1 {
                if !rest.ends_with(part) {
                    return false;
                }
            } else {
                match rest.find(part) {
                    Some(idx) => rest = &rest[idx + part.len()..],
                    None => return false,
                }
            }
        }
        true
    }
}

#[async_trait::async_trait]
impl CacheOperations for MemoryCacheService {
    async fn cache_data<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        let data = serde_json::to_string(value).map_err(CacheError::Serialization)?;
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                data,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get_cached<T: DeserializeOwned + Send>(&self, key: &str) -> CacheResult<T> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        self.evict_expired(&mut entries);
        match entries.get(key) {
            Some(entry) => {
                let value = serde_json::from_str::<T>(&entry.data)
                    .map_err(CacheError::Serialization)?;
                self.hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                Ok(value)
            }
            None => {
                self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                Err(CacheError::KeyNotFound)
            }
        }
    }

    async fn invalidate_key(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.remove(key);
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> CacheResult<usize> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let to_remove: Vec<String> = entries
            .keys()
            .filter(|k| Self::matches_pattern(k, pattern))
            .cloned()
            .collect();
        for key in &to_remove {
            entries.remove(key);
        }
        Ok(to_remove.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_value() {
        let cache = MemoryCacheService::new();
        cache.cache_data("k1", &42i32, Duration::from_secs(60)).await.unwrap();
        let v: i32 = cache.get_cached("k1").await.unwrap();
        assert_eq!(v, 42);
    }

    #[tokio::test]
    async fn miss_on_unknown_key() {
        let cache = MemoryCacheService::new();
        let err = cache.get_cached::<i32>("missing").await.unwrap_err();
        assert!(matches!(err, CacheError::KeyNotFound));
    }

    #[tokio::test]
    async fn invalidate_pattern_removes_matching_keys_only() {
        let cache = MemoryCacheService::new();
        cache.cache_data("cursor:userId:1:a", &1i32, Duration::from_secs(60)).await.unwrap();
        cache.cache_data("cursor:userId:1:b", &1i32, Duration::from_secs(60)).await.unwrap();
        cache.cache_data("cursor:userId:2:a", &1i32, Duration::from_secs(60)).await.unwrap();

        let removed = cache.invalidate_pattern("cursor:userId:1*").await.unwrap();
        assert_eq!(removed, 2);
        assert!(cache.get_cached::<i32>("cursor:userId:2:a").await.is_ok());
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let cache = MemoryCacheService::new();
        cache.cache_data("k1", &1i32, Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get_cached::<i32>("k1").await.is_err());
    }
}
