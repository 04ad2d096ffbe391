//! Remote cache tier port.
//!
//! The remote tier is shared and best-effort: every failure is reported as a
//! `CacheStoreError` and absorbed by the multi-tier cache, which keeps
//! serving from its local tier.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::cache::KeyPattern;

/// A value read from the remote tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteValue {
    pub value: String,
    /// Remaining time to live, when the store reports one.
    pub ttl: Option<Duration>,
}

/// Port for a remote key/value cache with server-side TTL.
///
/// Keys passed in are logical cache keys; namespacing is the adapter's job.
#[async_trait]
pub trait RemoteCacheStore: Send + Sync {
    /// Short name for logs and health detail ("redis", "memory", "none").
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<RemoteValue>, CacheStoreError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Returns whether a key was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError>;

    /// Remove keys matching `pattern`, returning the logical keys removed.
    async fn clear(&self, pattern: &KeyPattern) -> Result<Vec<String>, CacheStoreError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), CacheStoreError>;
}

/// Errors from the remote tier.
#[derive(Debug, Clone, Error)]
pub enum CacheStoreError {
    #[error("cache store connection failed: {0}")]
    Connection(String),

    #[error("cache store timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache value could not be (de)serialized: {0}")]
    Serialization(String),

    #[error("cache store error: {0}")]
    Backend(String),
}
