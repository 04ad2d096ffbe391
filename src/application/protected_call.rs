//! ProtectedCall - rate limit, cache and circuit breaker around one call.
//!
//! ```text
//! rate limiter ──denied──> RateLimited
//!      │
//!    cache ──hit──> cached value
//!      │
//!   breaker ──> operation ──Ok──> cache.set ──> value
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::{CircuitBreaker, MultiTierCache};
use crate::domain::circuit::CircuitBreakerError;
use crate::ports::{RateLimitKey, RateLimitResult, RateLimitScope, RateLimiter};

/// Why a protected call produced no value.
#[derive(Debug, Error)]
pub enum ProtectedCallError<E> {
    /// The rate limiter denied the request; the operation was not attempted.
    #[error("{message}")]
    RateLimited {
        scope: RateLimitScope,
        retry_after_secs: u32,
        message: String,
    },

    /// The breaker rejected the call, it timed out, or the operation failed.
    #[error("{0}")]
    Circuit(CircuitBreakerError<E>),
}

impl<E> ProtectedCallError<E> {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProtectedCallError::RateLimited { .. })
    }
}

/// A dependency call guarded by a limiter, a cache and a breaker.
#[derive(Clone)]
pub struct ProtectedCall {
    limiter: Arc<dyn RateLimiter>,
    breaker: Arc<CircuitBreaker>,
    cache: Arc<MultiTierCache>,
    ttl: Option<Duration>,
}

impl ProtectedCall {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        breaker: Arc<CircuitBreaker>,
        cache: Arc<MultiTierCache>,
    ) -> Self {
        Self {
            limiter,
            breaker,
            cache,
            ttl: None,
        }
    }

    /// TTL for values written after a successful call; the cache default
    /// applies otherwise.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Serve `cache_key` from cache, or run `operation` through the breaker
    /// and cache its result. A denied rate-limit check consumes nothing.
    pub async fn execute<E, F, Fut>(
        &self,
        rate_key: &RateLimitKey,
        cache_key: &str,
        operation: F,
    ) -> Result<String, ProtectedCallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let RateLimitResult::Denied(denied) = self.limiter.check(rate_key).await {
            tracing::debug!(
                key = %rate_key.storage_key(),
                retry_after_secs = denied.retry_after_secs,
                "Protected call rate limited"
            );
            return Err(ProtectedCallError::RateLimited {
                scope: denied.scope,
                retry_after_secs: denied.retry_after_secs,
                message: denied.message,
            });
        }

        if let Some(cached) = self.cache.get(cache_key).await {
            return Ok(cached);
        }

        let value = self
            .breaker
            .call(operation())
            .await
            .map_err(ProtectedCallError::Circuit)?;

        self.cache.set(cache_key, value.clone(), self.ttl).await;
        Ok(value)
    }
}

impl std::fmt::Debug for ProtectedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectedCall")
            .field("breaker", &self.breaker.name())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
