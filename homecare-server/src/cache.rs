//! Opportunistic read-through cache
//!
//! Backed by Redis when a connection is available, with an in-process
//! cache standing in when it is not. Cache misses and backend failures
//! fall through to the database, so nothing here is load-bearing for
//! correctness.

use moka::future::Cache;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TTL_SECS: u64 = 300;
const LOCAL_CAPACITY: u64 = 10_000;

#[derive(Clone)]
pub struct CacheLayer {
    redis: Option<ConnectionManager>,
    local: Cache<String, String>,
    ttl: Duration,
}

impl CacheLayer {
    /// Connect to Redis; on failure run with the in-process cache only
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let redis = match redis_url {
            Some(url) => match Self::open_redis(url).await {
                Ok(manager) => {
                    debug!("redis cache connected");
                    Some(manager)
                }
                Err(e) => {
                    warn!(error = %e, "redis unavailable, using in-process cache only");
                    None
                }
            },
            None => None,
        };

        Self {
            redis,
            local: Self::build_local(DEFAULT_TTL_SECS),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }

    /// In-process-only cache (tests, local development)
    pub fn in_process() -> Self {
        Self {
            redis: None,
            local: Self::build_local(DEFAULT_TTL_SECS),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }

    async fn open_redis(url: &str) -> redis::RedisResult<ConnectionManager> {
        let client = redis::Client::open(url)?;
        ConnectionManager::new(client).await
    }

    fn build_local(ttl_seconds: u64) -> Cache<String, String> {
        Cache::builder()
            .max_capacity(LOCAL_CAPACITY)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .support_invalidation_closures()
            .build()
    }

    /// Fetch a cached value, deserialized from JSON
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match &self.redis {
            Some(manager) => {
                let mut conn = manager.clone();
                match conn.get::<_, Option<String>>(key).await {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(key, error = %e, "redis get failed, trying local cache");
                        self.local.get(key).await
                    }
                }
            }
            None => self.local.get(key).await,
        }?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    /// Store a value as JSON under the default TTL
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache value, skipping");
                return;
            }
        };

        if let Some(manager) = &self.redis {
            let mut conn = manager.clone();
            if let Err(e) = conn
                .set_ex::<_, _, ()>(key, &raw, self.ttl.as_secs())
                .await
            {
                warn!(key, error = %e, "redis set failed, caching locally");
            }
        }
        self.local.insert(key.to_string(), raw).await;
    }

    /// Drop a single cache entry
    pub async fn invalidate(&self, key: &str) {
        if let Some(manager) = &self.redis {
            let mut conn = manager.clone();
            if let Err(e) = conn.del::<_, ()>(key).await {
                warn!(key, error = %e, "redis del failed");
            }
        }
        self.local.invalidate(key).await;
    }

    /// Drop every entry whose key starts with the prefix
    ///
    /// Used after catalog writes to clear all cached hierarchy views of
    /// the touched service.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        if let Some(manager) = &self.redis {
            let mut conn = manager.clone();
            let pattern = format!("{}*", prefix);
            match conn.keys::<_, Vec<String>>(&pattern).await {
                Ok(keys) if !keys.is_empty() => {
                    if let Err(e) = conn.del::<_, ()>(keys).await {
                        warn!(prefix, error = %e, "redis prefix invalidation failed");
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(prefix, error = %e, "redis keys scan failed"),
            }
        }

        let prefix = prefix.to_string();
        if let Err(e) = self
            .local
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            warn!(error = %e, "local prefix invalidation failed");
        }
    }
}

/// Cache key for a service's hierarchical view
pub fn hierarchy_key(service_id: uuid::Uuid) -> String {
    format!("catalog:hierarchy:{}", service_id)
}

/// Cache key prefix for all catalog entries
pub const CATALOG_PREFIX: &str = "catalog:";

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_round_trip() {
        let cache = CacheLayer::in_process();
        cache.set("k", &vec![1, 2, 3]).await;
        let value: Option<Vec<i32>> = cache.get("k").await;
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = CacheLayer::in_process();
        cache.set("k", &42).await;
        cache.invalidate("k").await;
        // moka invalidation is applied synchronously for direct keys
        let value: Option<i32> = cache.get("k").await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = CacheLayer::in_process();
        let value: Option<String> = cache.get("absent").await;
        assert_eq!(value, None);
    }
}
