//! Unified caching layer for list, search, and cursor responses.
//!
//! Single-entity reads never go through here — they hit the repository
//! directly, trading a small latency cost for strong consistency right
//! after a write. This crate only fronts the paged/filtered/searched
//! query paths, where a stale read is cheap and invalidation is
//! pattern-based.
//!
//! - Unified key schema: `{operation}:{hash}` via [`keys::generate_hash_key`]
//! - SCAN-based pattern invalidation (no blocking KEYS)
//! - Disabled mode: every call degrades to a miss without branching twice
//!   on the hot path
//! - A [`MemoryCacheService`] reference implementation for tests and
//!   environments without Redis

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_cache;

pub use error::{CacheError, CacheResult};
pub use keys::generate_hash_key;
pub use memory::{MemoryCacheService, Stats};
pub use metrics::CacheMetrics;
pub use redis_cache::{RedisCacheService, SharedRedis};

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Default TTL values (seconds)
pub mod ttl {
    pub const QUERY: u64 = 300;
    pub const CURSOR: u64 = 300;
    pub const SEARCH: u64 = 600;
}

/// Core cache operations shared by every backing implementation.
///
/// `cache_data`/`get_cached` are the hot path; a disabled cache must answer
/// both with [`CacheError::CacheDisabled`] after a single branch, letting
/// callers treat it exactly like a miss. `invalidate_key`/`invalidate_pattern`
/// degrade to no-ops when disabled rather than erroring, since there is
/// nothing useful for a caller to do with an invalidation failure.
#[async_trait::async_trait]
pub trait CacheOperations: Send + Sync {
    /// Marshal and store a value under `key` for `ttl`.
    async fn cache_data<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()>;

    /// Unmarshal the value stored at `key`. `Err(CacheError::KeyNotFound)` on miss.
    async fn get_cached<T: DeserializeOwned + Send>(&self, key: &str) -> CacheResult<T>;

    /// Remove a single key.
    async fn invalidate_key(&self, key: &str) -> CacheResult<()>;

    /// Remove every key matching a glob pattern (`*` wildcard). Returns the
    /// number of keys removed.
    async fn invalidate_pattern(&self, pattern: &str) -> CacheResult<usize>;
}
