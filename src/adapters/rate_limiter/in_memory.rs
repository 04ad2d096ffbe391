//! In-process sliding window rate limiter.
//!
//! Each key keeps a log of admission instants inside the trailing window.
//! State is per process; nothing is shared between instances.
//!
//! Idle keys are evicted: `sweep_idle` drops keys with an empty window that
//! have not been seen for `idle_key_ttl`, and a full key table evicts its
//! least recently seen key before tracking a new one.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::health::ComponentHealth;
use crate::domain::rate_limit::SlidingWindow;
use crate::ports::{
    HealthCheckError, HealthCheckable, RateLimitDenied, RateLimitKey, RateLimitResult,
    RateLimitStatus, RateLimiter,
};

use super::config::RateLimitConfig;

/// Last-seen instant plus a tiebreaker, unique per touch.
type Stamp = (Instant, u64);

#[derive(Debug)]
struct Tracked {
    window: SlidingWindow,
    stamp: Stamp,
}

/// Windows by key, indexed by when each key was last seen.
#[derive(Debug, Default)]
struct KeyTable {
    windows: HashMap<String, Tracked>,
    by_last_seen: BTreeMap<Stamp, String>,
    next_stamp: u64,
}

impl KeyTable {
    fn len(&self) -> usize {
        self.windows.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.windows.contains_key(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut SlidingWindow> {
        self.windows.get_mut(key).map(|tracked| &mut tracked.window)
    }

    /// Window for `key`, created if missing, marked as seen at `now`.
    fn touch(&mut self, key: String, now: Instant) -> &mut SlidingWindow {
        let stamp = (now, self.next_stamp);
        self.next_stamp += 1;

        match self.windows.entry(key) {
            Entry::Occupied(entry) => {
                let tracked = entry.into_mut();
                if let Some(key) = self.by_last_seen.remove(&tracked.stamp) {
                    self.by_last_seen.insert(stamp, key);
                }
                tracked.stamp = stamp;
                &mut tracked.window
            }
            Entry::Vacant(entry) => {
                self.by_last_seen.insert(stamp, entry.key().clone());
                &mut entry
                    .insert(Tracked {
                        window: SlidingWindow::new(now),
                        stamp,
                    })
                    .window
            }
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(tracked) = self.windows.remove(key) {
            self.by_last_seen.remove(&tracked.stamp);
        }
    }

    /// Remove idle keys. Only keys unseen for `idle_ttl` are inspected.
    fn evict_idle(&mut self, now: Instant, window: Duration, idle_ttl: Duration) -> usize {
        let Some(cutoff) = now.checked_sub(idle_ttl) else {
            return 0;
        };
        let stale: Vec<(Stamp, String)> = self
            .by_last_seen
            .range(..=(cutoff, u64::MAX))
            .map(|(stamp, key)| (*stamp, key.clone()))
            .collect();

        let mut removed = 0;
        for (stamp, key) in stale {
            let idle = self
                .windows
                .get_mut(&key)
                .map_or(true, |tracked| tracked.window.is_idle(now, window, idle_ttl));
            if idle {
                self.windows.remove(&key);
                self.by_last_seen.remove(&stamp);
                removed += 1;
            }
        }
        removed
    }

    /// Remove the least recently seen key.
    fn evict_stalest(&mut self) -> Option<String> {
        let (_, key) = self.by_last_seen.pop_first()?;
        self.windows.remove(&key);
        Some(key)
    }
}

/// Sliding window rate limiter for a single process.
///
/// One mutex guards the whole key table, so prune, check and append for a
/// key happen as one step.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    config: RateLimitConfig,
    table: Mutex<KeyTable>,
    admitted: AtomicU64,
    rejected: AtomicU64,
    evicted_keys: AtomicU64,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            table: Mutex::new(KeyTable::default()),
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            evicted_keys: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.table.lock().await.len()
    }

    /// Drop idle keys. Returns how many were removed.
    pub async fn sweep_idle(&self) -> usize {
        let now = Instant::now();
        let mut table = self.table.lock().await;
        let removed = self.evict_idle(&mut table, now);
        if removed > 0 {
            tracing::debug!(removed, remaining = table.len(), "Evicted idle rate limit keys");
        }
        removed
    }

    fn evict_idle(&self, table: &mut KeyTable, now: Instant) -> usize {
        let removed = table.evict_idle(now, self.config.window(), self.config.idle_key_ttl());
        self.evicted_keys.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Make space for one more key when the table is full.
    fn make_room(&self, table: &mut KeyTable, now: Instant) {
        if table.len() < self.config.max_keys {
            return;
        }
        self.evict_idle(table, now);
        while table.len() >= self.config.max_keys {
            match table.evict_stalest() {
                Some(key) => {
                    tracing::warn!(key = %key, "Rate limit key table full, evicting least recently seen key");
                    self.evicted_keys.fetch_add(1, Ordering::Relaxed);
                }
                None => break,
            }
        }
    }

    fn window_secs(&self) -> u32 {
        self.config.window_secs
    }
}

fn retry_after_secs(wait: Duration) -> u32 {
    let secs = (wait.as_millis() + 999) / 1000;
    (secs.min(u128::from(u32::MAX)) as u32).max(1)
}

#[async_trait]
impl RateLimiter for SlidingWindowRateLimiter {
    async fn check(&self, key: &RateLimitKey) -> RateLimitResult {
        let storage_key = key.storage_key();
        let limit = self.config.requests_per_minute;
        let window = self.config.window();
        let now = Instant::now();

        let mut table = self.table.lock().await;
        if !table.contains(&storage_key) {
            self.make_room(&mut table, now);
        }
        let state = table.touch(storage_key, now);

        if state.try_admit(now, limit, window) {
            self.admitted.fetch_add(1, Ordering::Relaxed);
            return RateLimitResult::Allowed(RateLimitStatus {
                limit,
                remaining: limit.saturating_sub(state.count() as u32),
                reset_at: state.reset_at(window),
                window_secs: self.window_secs(),
            });
        }

        self.rejected.fetch_add(1, Ordering::Relaxed);
        let wait = state
            .reset_at(window)
            .map(|at| at.saturating_duration_since(now))
            .unwrap_or(window);
        let retry_after = retry_after_secs(wait);
        tracing::debug!(scope = %key.scope, identifier = %key.identifier, retry_after, "Rate limit exceeded");

        RateLimitResult::Denied(RateLimitDenied {
            limit,
            retry_after_secs: retry_after,
            scope: key.scope,
            message: format!(
                "Rate limit exceeded for {}. Retry after {} seconds.",
                key.scope, retry_after
            ),
        })
    }

    async fn reset_time(&self, key: &RateLimitKey) -> Option<Instant> {
        let window = self.config.window();
        let now = Instant::now();
        let mut table = self.table.lock().await;
        let state = table.get_mut(&key.storage_key())?;
        state.prune(now, window);
        state.reset_at(window)
    }

    async fn status(&self, key: &RateLimitKey) -> RateLimitStatus {
        let limit = self.config.requests_per_minute;
        let window = self.config.window();
        let now = Instant::now();

        let mut table = self.table.lock().await;
        let (count, reset_at) = match table.get_mut(&key.storage_key()) {
            Some(state) => {
                state.prune(now, window);
                (state.count() as u32, state.reset_at(window))
            }
            None => (0, None),
        };

        RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(count),
            reset_at,
            window_secs: self.window_secs(),
        }
    }

    async fn reset(&self, key: &RateLimitKey) {
        self.table.lock().await.remove(&key.storage_key());
    }
}

#[async_trait]
impl HealthCheckable for SlidingWindowRateLimiter {
    fn component_name(&self) -> &str {
        "rate_limiter"
    }

    async fn health(&self) -> Result<ComponentHealth, HealthCheckError> {
        let tracked = self.tracked_keys().await;
        let detail = json!({
            "tracked_keys": tracked,
            "max_keys": self.config.max_keys,
            "requests_per_minute": self.config.requests_per_minute,
        });
        if tracked >= self.config.max_keys {
            let mut detail = detail;
            detail["reason"] = json!("key table at capacity, evicting active keys");
            return Ok(ComponentHealth::degraded(detail));
        }
        Ok(ComponentHealth::healthy(detail))
    }

    async fn metrics(&self) -> Result<Value, HealthCheckError> {
        Ok(json!({
            "tracked_keys": self.tracked_keys().await,
            "admitted": self.admitted.load(Ordering::Relaxed),
            "rejected": self.rejected.load(Ordering::Relaxed),
            "evicted_keys": self.evicted_keys.load(Ordering::Relaxed),
        }))
    }
}
