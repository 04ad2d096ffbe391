//! ResilienceContext - every resilience component, built once at startup.
//!
//! The context owns the breaker registry, rate limiter, cache and health
//! aggregator, plus the background tasks that keep them tidy. It is passed
//! explicitly to whatever needs it and stopped with [`ResilienceContext::shutdown`].

use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{
    CircuitBreaker, CircuitBreakerRegistry, HealthAggregator, MultiTierCache, ProtectedCall,
};
use crate::adapters::cache::{InMemoryCacheStore, NoOpCacheStore, RedisCacheStore};
use crate::adapters::rate_limiter::SlidingWindowRateLimiter;
use crate::config::{AppConfig, RemoteBackend, ValidationError};
use crate::domain::foundation::lock;
use crate::domain::health::HealthSnapshot;
use crate::ports::{CacheStoreError, RefreshAheadHandler, RemoteCacheStore};

/// Errors raised while building the context.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("Required remote cache unavailable: {0}")]
    RemoteCacheUnavailable(#[from] CacheStoreError),
}

/// Process-wide resilience components.
pub struct ResilienceContext {
    config: AppConfig,
    breakers: Arc<CircuitBreakerRegistry>,
    rate_limiter: Arc<SlidingWindowRateLimiter>,
    cache: Arc<MultiTierCache>,
    health: Arc<HealthAggregator>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    latest_health: Mutex<Option<watch::Receiver<Option<HealthSnapshot>>>>,
}

impl ResilienceContext {
    /// Build every component from `config`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` fails validation
    /// - `RemoteCacheUnavailable` if the Redis tier cannot be reached and
    ///   `cache.require_remote` is set; otherwise the cache runs local-only
    pub async fn build(config: &AppConfig) -> Result<Self, InitError> {
        Self::build_with_refresh_handler(config, None).await
    }

    /// Like [`build`](Self::build), forwarding refresh-ahead signals to `handler`.
    pub async fn build_with_refresh_handler(
        config: &AppConfig,
        handler: Option<Arc<dyn RefreshAheadHandler>>,
    ) -> Result<Self, InitError> {
        config.validate()?;

        let breakers = Arc::new(CircuitBreakerRegistry::new());
        for name in config.circuit_breaker.breakers.keys() {
            breakers.get_or_create(name, config.circuit_breaker.config_for(name));
        }

        let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(config.rate_limit.clone()));

        let mut cache = MultiTierCache::new(&config.cache).with_remote(remote_store(config).await?);
        if let Some(handler) = handler {
            cache = cache.with_refresh_handler(handler);
        }
        let cache = Arc::new(cache);

        let health = Arc::new(HealthAggregator::new(config.health.check_timeout()));
        health.register(breakers.clone());
        health.register(rate_limiter.clone());
        health.register(cache.clone());

        tracing::info!(
            breakers = breakers.len(),
            remote = ?config.cache.remote,
            remote_enabled = cache.remote_enabled(),
            "Resilience context ready"
        );

        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            config: config.clone(),
            breakers,
            rate_limiter,
            cache,
            health,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
            latest_health: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    pub fn rate_limiter(&self) -> &Arc<SlidingWindowRateLimiter> {
        &self.rate_limiter
    }

    pub fn cache(&self) -> &Arc<MultiTierCache> {
        &self.cache
    }

    pub fn health(&self) -> &Arc<HealthAggregator> {
        &self.health
    }

    /// Breaker for `name`, created from configured settings on first use.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .get_or_create(name, self.config.circuit_breaker.config_for(name))
    }

    /// A [`ProtectedCall`] over the shared limiter and cache with the named breaker.
    pub fn protected_call(&self, breaker: &str) -> ProtectedCall {
        ProtectedCall::new(
            self.rate_limiter.clone(),
            self.breaker(breaker),
            self.cache.clone(),
        )
    }

    /// Spawn the health monitor and the rate limiter sweeper. Calling it
    /// again while they run does nothing.
    pub fn start(&self) {
        let mut tasks = lock(&self.tasks);
        if !tasks.is_empty() {
            return;
        }
        if *self.shutdown_tx.borrow() {
            tracing::warn!("Resilience context already shut down, not starting tasks");
            return;
        }

        let monitor = self
            .health
            .spawn_monitor(self.config.health.interval(), self.shutdown_tx.subscribe());
        *lock(&self.latest_health) = Some(monitor.subscribe());
        tasks.push(monitor.into_handle());

        tasks.push(spawn_sweeper(
            self.rate_limiter.clone(),
            self.config.rate_limit.sweep_interval(),
            self.shutdown_tx.subscribe(),
        ));

        tracing::info!(tasks = tasks.len(), "Background tasks started");
    }

    /// Latest snapshot published by the health monitor.
    pub fn latest_health(&self) -> Option<HealthSnapshot> {
        lock(&self.latest_health)
            .as_ref()
            .and_then(|rx| rx.borrow().clone())
    }

    /// Signal background tasks to stop and wait for them.
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);

        let tasks: Vec<JoinHandle<()>> = lock(&self.tasks).drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }
        tracing::info!("Resilience context shut down");
    }
}

impl std::fmt::Debug for ResilienceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceContext")
            .field("breakers", &self.breakers.names())
            .field("cache", &self.cache)
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

async fn remote_store(config: &AppConfig) -> Result<Arc<dyn RemoteCacheStore>, InitError> {
    match config.cache.remote {
        RemoteBackend::None => Ok(Arc::new(NoOpCacheStore)),
        RemoteBackend::Memory => Ok(Arc::new(InMemoryCacheStore::new())),
        RemoteBackend::Redis => {
            match RedisCacheStore::connect(&config.redis, config.cache.key_prefix.clone()).await {
                Ok(store) => Ok(Arc::new(store)),
                Err(e) if config.cache.require_remote => Err(e.into()),
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, cache running local-only");
                    Ok(Arc::new(NoOpCacheStore))
                }
            }
        }
    }
}

fn spawn_sweeper(
    limiter: Arc<SlidingWindowRateLimiter>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately; nothing is idle yet
        ticker.tick().await;

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    limiter.sweep_idle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Rate limiter sweeper stopped");
    })
}
