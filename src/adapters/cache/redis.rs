//! Redis-backed remote cache tier.
//!
//! Values are stored as plain strings under `{key_prefix}{key}` with a
//! millisecond TTL (`SET .. PX`). Reads pipeline `GET` and `PTTL` so the
//! local tier can inherit the remaining lifetime.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use secrecy::ExposeSecret;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::domain::cache::KeyPattern;
use crate::domain::foundation::saturating_millis;
use crate::ports::{CacheStoreError, RemoteCacheStore, RemoteValue};

/// Keys deleted per `DEL` during a pattern clear.
const DELETE_BATCH: usize = 500;

/// Largest `PX` sent to Redis, about 100 years. Redis rejects expiries past
/// `i64` milliseconds.
const MAX_PX_MILLIS: u64 = 100 * 365 * 86_400 * 1_000;

/// TTL as a `PX` argument: at least 1 ms, never truncated.
fn px_millis(ttl: Duration) -> u64 {
    saturating_millis(ttl).clamp(1, MAX_PX_MILLIS)
}

/// Redis remote tier over a multiplexed connection.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisCacheStore {
    /// Wrap an existing connection.
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Open a client and connect, bounded by the configured timeout.
    pub async fn connect(
        config: &RedisConfig,
        key_prefix: impl Into<String>,
    ) -> Result<Self, CacheStoreError> {
        let client = redis::Client::open(config.url.expose_secret().as_str())
            .map_err(|e| CacheStoreError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_tokio_connection())
            .await
            .map_err(|_| CacheStoreError::Timeout(config.timeout()))?
            .map_err(CacheStoreError::from)?;

        Ok(Self::new(conn, key_prefix))
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn strip_namespace(&self, key: String) -> String {
        match key.strip_prefix(&self.key_prefix) {
            Some(logical) => logical.to_string(),
            None => key,
        }
    }
}

impl From<redis::RedisError> for CacheStoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_timeout() {
            CacheStoreError::Backend(format!("timeout: {}", e))
        } else if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() {
            CacheStoreError::Connection(e.to_string())
        } else if e.kind() == redis::ErrorKind::TypeError {
            CacheStoreError::Serialization(e.to_string())
        } else {
            CacheStoreError::Backend(e.to_string())
        }
    }
}

#[async_trait]
impl RemoteCacheStore for RedisCacheStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<RemoteValue>, CacheStoreError> {
        let redis_key = self.namespaced(key);
        let mut conn = self.conn.clone();

        let (value, pttl): (Option<String>, i64) = redis::pipe()
            .get(&redis_key)
            .cmd("PTTL")
            .arg(&redis_key)
            .query_async(&mut conn)
            .await?;

        // PTTL: -1 no expiry, -2 missing
        Ok(value.map(|value| RemoteValue {
            value,
            ttl: (pttl > 0).then(|| Duration::from_millis(pttl as u64)),
        }))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        let redis_key = self.namespaced(key);
        let mut conn = self.conn.clone();
        let ttl_ms = px_millis(ttl);

        redis::cmd("SET")
            .arg(&redis_key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.namespaced(key)).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(self.namespaced(key)).await?;
        Ok(exists)
    }

    async fn clear(&self, pattern: &KeyPattern) -> Result<Vec<String>, CacheStoreError> {
        let glob = pattern.to_redis_glob(&self.key_prefix);

        let mut keys = Vec::new();
        {
            let mut scan_conn = self.conn.clone();
            let mut iter = scan_conn.scan_match::<_, String>(&glob).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        let mut conn = self.conn.clone();
        for batch in keys.chunks(DELETE_BATCH) {
            conn.del::<_, ()>(batch).await?;
        }

        Ok(keys.into_iter().map(|k| self.strip_namespace(k)).collect())
    }

    async fn ping(&self) -> Result<(), CacheStoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    // Note: Redis integration tests require a running Redis instance and are
    // run separately, e.g.
    //
    // #[tokio::test]
    // #[ignore] // Run with: cargo test -- --ignored
    // async fn round_trips_through_redis() {
    //     let client = redis::Client::open("redis://127.0.0.1/").unwrap();
    //     let conn = client.get_multiplexed_tokio_connection().await.unwrap();
    //     let store = RedisCacheStore::new(conn, "test:");
    //     ...
    // }

    use super::*;

    #[test]
    fn px_stays_within_redis_limits() {
        assert_eq!(px_millis(Duration::from_millis(250)), 250);
        assert_eq!(px_millis(Duration::from_micros(10)), 1);
        assert_eq!(px_millis(Duration::from_secs(u64::MAX)), MAX_PX_MILLIS);
        assert_eq!(px_millis(Duration::MAX), MAX_PX_MILLIS);
    }

    #[test]
    fn clear_glob_is_scoped_to_prefix() {
        let glob = KeyPattern::new("session:*").to_redis_glob("cache:");
        assert_eq!(glob, "cache:session:*");
    }
}
