//! In-memory remote tier for tests and single-process deployments.
//!
//! Behaves like a remote store (own TTLs, pattern clears) and can be switched
//! offline to exercise the cache's degraded, local-only path.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::cache::KeyPattern;
use crate::domain::foundation::{deadline_after, lock};
use crate::ports::{CacheStoreError, RemoteCacheStore, RemoteValue};

#[derive(Debug)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

/// In-memory `RemoteCacheStore`.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, StoredValue>>,
    offline: AtomicBool,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        lock(&self.entries)
            .values()
            .filter(|stored| stored.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_online(&self) -> Result<(), CacheStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheStoreError::Connection("in-memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCacheStore for InMemoryCacheStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<RemoteValue>, CacheStoreError> {
        self.ensure_online()?;
        let now = Instant::now();
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(stored) if stored.expires_at > now => Ok(Some(RemoteValue {
                value: stored.value.clone(),
                ttl: Some(stored.expires_at - now),
            })),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        self.ensure_online()?;
        lock(&self.entries).insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: deadline_after(Instant::now(), ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError> {
        self.ensure_online()?;
        Ok(lock(&self.entries).remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        self.ensure_online()?;
        let now = Instant::now();
        Ok(lock(&self.entries)
            .get(key)
            .map(|stored| stored.expires_at > now)
            .unwrap_or(false))
    }

    async fn clear(&self, pattern: &KeyPattern) -> Result<Vec<String>, CacheStoreError> {
        self.ensure_online()?;
        let now = Instant::now();
        let mut entries = lock(&self.entries);
        entries.retain(|_, stored| stored.expires_at > now);
        let matched: Vec<String> = entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();
        for key in &matched {
            entries.remove(key);
        }
        Ok(matched)
    }

    async fn ping(&self) -> Result<(), CacheStoreError> {
        self.ensure_online()
    }
}
