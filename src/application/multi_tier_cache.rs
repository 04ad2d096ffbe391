//! MultiTierCache - bounded local tier in front of an optional remote tier.
//!
//! Reads check the local tier first, then the remote tier; a remote hit is
//! copied into the local tier. Writes land locally at once and are pushed to
//! the remote tier best-effort. Remote failures are logged and counted but
//! never surface to callers, so the cache degrades to local-only.
//!
//! Remote I/O never happens while the local tier's lock is held.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::adapters::cache::NoOpCacheStore;
use crate::config::CacheConfig;
use crate::domain::cache::{CacheEntry, CacheStats, KeyPattern};
use crate::domain::foundation::lock;
use crate::domain::health::ComponentHealth;
use crate::ports::{
    CacheStoreError, HealthCheckError, HealthCheckable, NoOpRefreshHandler, RefreshAheadHandler,
    RemoteCacheStore,
};

#[derive(Debug, Default)]
struct Counters {
    local_hits: AtomicU64,
    remote_hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    refresh_signals: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) {
    if by > 0 {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

enum LocalLookup {
    Hit {
        value: String,
        refresh_due: Option<Duration>,
    },
    Expired,
    Miss,
}

#[derive(Debug, Default)]
struct LocalTier {
    entries: HashMap<String, CacheEntry>,
    next_sequence: u64,
}

impl LocalTier {
    fn lookup(&mut self, key: &str, now: Instant, refresh_threshold: f64) -> LocalLookup {
        let Some(entry) = self.entries.get_mut(key) else {
            return LocalLookup::Miss;
        };
        if entry.is_expired(now) {
            self.entries.remove(key);
            return LocalLookup::Expired;
        }

        let refresh_due = if !entry.refresh_signalled && entry.is_refresh_due(now, refresh_threshold) {
            entry.refresh_signalled = true;
            Some(entry.remaining_ttl(now))
        } else {
            None
        };

        LocalLookup::Hit {
            value: entry.value.clone(),
            refresh_due,
        }
    }

    /// Insert or replace; returns `(evicted, expired)` counts.
    fn insert(
        &mut self,
        key: &str,
        value: String,
        ttl: Duration,
        now: Instant,
        max_size: usize,
    ) -> (u64, u64) {
        let mut evicted = 0;
        let mut expired = 0;

        if !self.entries.contains_key(key) && self.entries.len() >= max_size {
            let before = self.entries.len();
            self.entries.retain(|_, e| !e.is_expired(now));
            expired = (before - self.entries.len()) as u64;

            while self.entries.len() > max_size.saturating_sub(1) {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.eviction_rank())
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        self.entries.remove(&k);
                        evicted += 1;
                    }
                    None => break,
                }
            }
        }

        self.next_sequence += 1;
        self.entries.insert(
            key.to_string(),
            CacheEntry::new(value, ttl, now, self.next_sequence),
        );
        (evicted, expired)
    }

    /// Validates expiry; an expired entry is purged and reported absent.
    fn contains(&mut self, key: &str, now: Instant) -> (bool, bool) {
        match self.entries.get(key) {
            Some(e) if e.is_expired(now) => {
                self.entries.remove(key);
                (false, true)
            }
            Some(_) => (true, false),
            None => (false, false),
        }
    }

    fn remove_matching(&mut self, pattern: &KeyPattern) -> Vec<String> {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|k| pattern.matches(k))
            .cloned()
            .collect();
        for key in &keys {
            self.entries.remove(key);
        }
        keys
    }
}

/// Two-tier cache of string values with TTL expiry and refresh-ahead.
pub struct MultiTierCache {
    local: Mutex<LocalTier>,
    remote: Arc<dyn RemoteCacheStore>,
    refresh_handler: Arc<dyn RefreshAheadHandler>,
    max_size: usize,
    default_ttl: Duration,
    refresh_threshold: f64,
    remote_timeout: Duration,
    counters: Counters,
}

impl MultiTierCache {
    /// Local-only cache; add a remote tier with [`with_remote`](Self::with_remote).
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            local: Mutex::new(LocalTier::default()),
            remote: Arc::new(NoOpCacheStore),
            refresh_handler: Arc::new(NoOpRefreshHandler),
            max_size: config.max_size.max(1),
            default_ttl: config.default_ttl(),
            refresh_threshold: config.refresh_threshold,
            remote_timeout: config.remote_timeout(),
            counters: Counters::default(),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteCacheStore>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_refresh_handler(mut self, handler: Arc<dyn RefreshAheadHandler>) -> Self {
        self.refresh_handler = handler;
        self
    }

    /// False when the remote tier is the no-op store.
    pub fn remote_enabled(&self) -> bool {
        self.remote.backend_name() != NoOpCacheStore::BACKEND_NAME
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let lookup = lock(&self.local).lookup(key, now, self.refresh_threshold);

        match lookup {
            LocalLookup::Hit { value, refresh_due } => {
                bump(&self.counters.local_hits, 1);
                if let Some(remaining) = refresh_due {
                    bump(&self.counters.refresh_signals, 1);
                    tracing::debug!(key = %key, remaining_ms = remaining.as_millis() as u64, "Refresh-ahead due");
                    self.refresh_handler.on_refresh_due(key, remaining);
                }
                return Some(value);
            }
            LocalLookup::Expired => bump(&self.counters.expirations, 1),
            LocalLookup::Miss => {}
        }

        if self.remote_enabled() {
            if let Some(Some(remote)) = self.remote_call("get", key, self.remote.get(key)).await {
                let ttl = remote.ttl.unwrap_or(self.default_ttl);
                self.insert_local(key, remote.value.clone(), ttl);
                bump(&self.counters.remote_hits, 1);
                return Some(remote.value);
            }
        }

        bump(&self.counters.misses, 1);
        None
    }

    /// Store `value` for `ttl` (the default TTL when `None`).
    pub async fn set(&self, key: &str, value: impl Into<String>, ttl: Option<Duration>) {
        let value = value.into();
        let ttl = ttl.unwrap_or(self.default_ttl);

        if self.remote_enabled() {
            self.insert_local(key, value.clone(), ttl);
            self.remote_call("set", key, self.remote.set(key, &value, ttl))
                .await;
        } else {
            self.insert_local(key, value, ttl);
        }
        bump(&self.counters.sets, 1);
    }

    /// Remove `key` from both tiers. Returns whether either tier held it.
    pub async fn delete(&self, key: &str) -> bool {
        let local = lock(&self.local).entries.remove(key).is_some();
        let remote = if self.remote_enabled() {
            self.remote_call("delete", key, self.remote.delete(key))
                .await
                .unwrap_or(false)
        } else {
            false
        };
        bump(&self.counters.deletes, 1);
        local || remote
    }

    pub async fn exists(&self, key: &str) -> bool {
        let (present, expired) = lock(&self.local).contains(key, Instant::now());
        if expired {
            bump(&self.counters.expirations, 1);
        }
        if present {
            return true;
        }
        if !self.remote_enabled() {
            return false;
        }
        self.remote_call("exists", key, self.remote.exists(key))
            .await
            .unwrap_or(false)
    }

    /// Remove every key matching `pattern` (all keys when `None`) from both
    /// tiers. Returns the number of distinct keys removed.
    pub async fn clear(&self, pattern: Option<&str>) -> usize {
        let pattern = pattern.map(KeyPattern::new).unwrap_or_else(KeyPattern::all);

        let mut removed: HashSet<String> = lock(&self.local)
            .remove_matching(&pattern)
            .into_iter()
            .collect();

        if self.remote_enabled() {
            if let Some(keys) = self
                .remote_call("clear", pattern.as_str(), self.remote.clear(&pattern))
                .await
            {
                removed.extend(keys);
            }
        }

        tracing::debug!(pattern = %pattern, removed = removed.len(), "Cache cleared");
        removed.len()
    }

    /// Deserialize a cached JSON value. A value that no longer matches `T`
    /// is reported as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Cached value did not deserialize");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), serde_json::Error> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw, ttl).await;
        Ok(())
    }

    /// Return the cached value for `key`, or run `loader`, cache its `Ok`
    /// result and return it. Loader errors are returned and not cached.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get_json(key).await {
            return Ok(cached);
        }

        let value = loader().await?;
        if let Err(e) = self.set_json(key, &value, ttl).await {
            tracing::warn!(key = %key, error = %e, "Loaded value could not be cached");
        }
        Ok(value)
    }

    /// Entries currently held locally, expired ones included until purged.
    pub fn local_len(&self) -> usize {
        lock(&self.local).entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CacheStats {
            local_hits: load(&self.counters.local_hits),
            remote_hits: load(&self.counters.remote_hits),
            misses: load(&self.counters.misses),
            sets: load(&self.counters.sets),
            deletes: load(&self.counters.deletes),
            errors: load(&self.counters.errors),
            evictions: load(&self.counters.evictions),
            expirations: load(&self.counters.expirations),
            refresh_signals: load(&self.counters.refresh_signals),
            local_size: self.local_len(),
            max_size: self.max_size,
            remote_enabled: self.remote_enabled(),
        }
    }

    fn insert_local(&self, key: &str, value: String, ttl: Duration) {
        let (evicted, expired) =
            lock(&self.local).insert(key, value, ttl, Instant::now(), self.max_size);
        bump(&self.counters.evictions, evicted);
        bump(&self.counters.expirations, expired);
        if evicted > 0 {
            tracing::debug!(key = %key, evicted, "Evicted oldest local entries");
        }
    }

    async fn remote_call<T, F>(&self, op: &'static str, key: &str, call: F) -> Option<T>
    where
        F: Future<Output = Result<T, CacheStoreError>>,
    {
        let error = match tokio::time::timeout(self.remote_timeout, call).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(e)) => e,
            Err(_) => CacheStoreError::Timeout(self.remote_timeout),
        };

        bump(&self.counters.errors, 1);
        tracing::warn!(
            backend = self.remote.backend_name(),
            op,
            key = %key,
            error = %error,
            "Remote cache call failed, continuing with local tier"
        );
        None
    }
}

impl std::fmt::Debug for MultiTierCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiTierCache")
            .field("backend", &self.remote.backend_name())
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HealthCheckable for MultiTierCache {
    fn component_name(&self) -> &str {
        "cache"
    }

    async fn health(&self) -> Result<ComponentHealth, HealthCheckError> {
        let backend = self.remote.backend_name();
        let local_size = self.local_len();

        if !self.remote_enabled() {
            return Ok(ComponentHealth::healthy(json!({
                "backend": backend,
                "local_size": local_size,
            })));
        }

        let ping = match tokio::time::timeout(self.remote_timeout, self.remote.ping()).await {
            Ok(result) => result,
            Err(_) => Err(CacheStoreError::Timeout(self.remote_timeout)),
        };

        Ok(match ping {
            Ok(()) => ComponentHealth::healthy(json!({
                "backend": backend,
                "local_size": local_size,
            })),
            Err(e) => ComponentHealth::degraded(json!({
                "backend": backend,
                "local_size": local_size,
                "mode": "local_only",
                "error": e.to_string(),
            })),
        })
    }

    async fn metrics(&self) -> Result<Value, HealthCheckError> {
        let stats = self.stats();
        let mut value =
            serde_json::to_value(&stats).map_err(|e| HealthCheckError::Failed(e.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.insert("hit_rate".to_string(), json!(stats.hit_rate()));
        }
        Ok(value)
    }
}
