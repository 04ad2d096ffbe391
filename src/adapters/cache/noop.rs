//! Remote tier that stores nothing.
//!
//! Selected by configuration (`cache.remote = "none"`) or when the configured
//! remote store could not be reached at startup and is not required. Every
//! read misses and every write succeeds, so the cache runs local-only.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::cache::KeyPattern;
use crate::ports::{CacheStoreError, RemoteCacheStore, RemoteValue};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCacheStore;

impl NoOpCacheStore {
    pub const BACKEND_NAME: &'static str = "none";
}

#[async_trait]
impl RemoteCacheStore for NoOpCacheStore {
    fn backend_name(&self) -> &'static str {
        Self::BACKEND_NAME
    }

    async fn get(&self, _key: &str) -> Result<Option<RemoteValue>, CacheStoreError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheStoreError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheStoreError> {
        Ok(false)
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheStoreError> {
        Ok(false)
    }

    async fn clear(&self, _pattern: &KeyPattern) -> Result<Vec<String>, CacheStoreError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), CacheStoreError> {
        Ok(())
    }
}
