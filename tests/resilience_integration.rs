//! Integration tests for the resilience components working together.
//!
//! These tests drive the public API only:
//! 1. A breaker-guarded dependency that keeps timing out
//! 2. Rate limiting, caching and the breaker composed as a `ProtectedCall`
//! 3. The full `ResilienceContext` lifecycle built from configuration
//!
//! Virtual time (`start_paused`) keeps timeouts and windows deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resilience_core::application::{
    CircuitBreakerRegistry, MultiTierCache, ProtectedCallError, ResilienceContext,
};
use resilience_core::config::{AppConfig, BreakerOverride, CacheConfig, RemoteBackend};
use resilience_core::domain::circuit::{CircuitBreakerConfig, CircuitBreakerError, CircuitState};
use resilience_core::domain::health::OverallStatus;
use resilience_core::adapters::rate_limiter::{RateLimitConfig, SlidingWindowRateLimiter};
use resilience_core::ports::{RateLimitKey, RateLimiter};

// =============================================================================
// Circuit breaker
// =============================================================================

#[tokio::test(start_paused = true)]
async fn payments_breaker_opens_after_two_timeouts_and_fails_fast() {
    let registry = CircuitBreakerRegistry::new();
    let payments = registry.get_or_create(
        "payments",
        CircuitBreakerConfig::default()
            .with_failure_threshold(2)
            .with_call_timeout(Duration::from_millis(50)),
    );
    let invocations = Arc::new(AtomicUsize::new(0));

    let slow_charge = |invocations: Arc<AtomicUsize>| async move {
        invocations.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, String>("charged")
    };

    for _ in 0..2 {
        let err = payments.call(slow_charge(invocations.clone())).await.unwrap_err();
        assert!(matches!(err, CircuitBreakerError::Timeout { .. }));
    }
    assert_eq!(payments.state(), CircuitState::Open);
    assert_eq!(invocations.load(Ordering::SeqCst), 2);

    let err = payments.call(slow_charge(invocations.clone())).await.unwrap_err();
    match err {
        CircuitBreakerError::Open { name, retry_after } => {
            assert_eq!(name, "payments");
            assert!(retry_after > Duration::ZERO);
        }
        other => panic!("expected open circuit, got {:?}", other),
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 2);

    let stats = payments.stats();
    assert_eq!(stats.timeout_calls, 2);
    assert_eq!(stats.rejected_calls, 1);
    assert_eq!(registry.health_summary().status, OverallStatus::Critical);
}

#[tokio::test(start_paused = true)]
async fn breaker_recovers_once_dependency_is_back() {
    let registry = CircuitBreakerRegistry::new();
    let search = registry.get_or_create(
        "search",
        CircuitBreakerConfig::default()
            .with_failure_threshold(3)
            .with_recovery_timeout(Duration::from_secs(30))
            .with_success_threshold(2),
    );

    for _ in 0..3 {
        let _ = search.call(async { Err::<(), _>("503") }).await;
    }
    assert!(search.call(async { Ok::<_, &str>(()) }).await.unwrap_err().is_open());

    tokio::time::advance(Duration::from_secs(30)).await;
    search.call(async { Ok::<_, &str>(()) }).await.unwrap();
    assert_eq!(search.state(), CircuitState::HalfOpen);
    search.call(async { Ok::<_, &str>(()) }).await.unwrap();
    assert_eq!(search.state(), CircuitState::Closed);
}

// =============================================================================
// Rate limiter and cache
// =============================================================================

#[tokio::test(start_paused = true)]
async fn rate_limit_window_slides() {
    let limiter = SlidingWindowRateLimiter::new(RateLimitConfig::per_minute(5));
    let key = RateLimitKey::user("u-42");

    for _ in 0..5 {
        assert!(limiter.allow(&key).await);
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    assert!(!limiter.allow(&key).await);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(limiter.allow(&key).await);
}

#[tokio::test(start_paused = true)]
async fn cache_ttl_round_trip() {
    let cache = MultiTierCache::new(&CacheConfig::default());
    cache.set("greeting", "hello", Some(Duration::from_secs(1))).await;
    assert_eq!(cache.get("greeting").await.as_deref(), Some("hello"));

    tokio::time::advance(Duration::from_millis(1_100)).await;
    assert_eq!(cache.get("greeting").await, None);
    assert_eq!(cache.local_len(), 0);
}

// =============================================================================
// Context
// =============================================================================

fn payments_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.cache.remote = RemoteBackend::Memory;
    config.rate_limit = RateLimitConfig::per_minute(2);
    config.circuit_breaker.breakers.insert(
        "payments".to_string(),
        BreakerOverride {
            failure_threshold: Some(2),
            call_timeout_ms: Some(50),
            ..Default::default()
        },
    );
    config
}

#[tokio::test(start_paused = true)]
async fn protected_call_through_context() {
    let ctx = ResilienceContext::build(&payments_config()).await.unwrap();
    let call = ctx.protected_call("payments").with_ttl(Duration::from_secs(60));
    let key = RateLimitKey::user("u-1");
    let invocations = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let counter = invocations.clone();
        let quote = call
            .execute(&key, "quote:eur", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("1.08".to_string())
            })
            .await
            .unwrap();
        assert_eq!(quote, "1.08");
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 1);

    let denied = call
        .execute(&key, "quote:eur", || async { Ok::<_, String>("x".to_string()) })
        .await;
    assert!(matches!(denied, Err(ProtectedCallError::RateLimited { .. })));

    let stats = ctx.cache().stats();
    assert_eq!(stats.local_hits, 1);
    assert!(stats.remote_enabled);
}

#[tokio::test(start_paused = true)]
async fn context_lifecycle_reports_open_breaker_in_health() {
    let ctx = ResilienceContext::build(&payments_config()).await.unwrap();
    ctx.start();

    let payments = ctx.breaker("payments");
    for _ in 0..2 {
        let _ = payments
            .call(async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, String>(())
            })
            .await;
    }

    let snapshot = ctx.health().health_check_all().await;
    // payments is the only breaker, so the registry reports critical -> unhealthy
    assert_eq!(snapshot.overall, OverallStatus::Degraded);
    assert_eq!(snapshot.issues.len(), 1);
    assert!(snapshot.issues[0].starts_with("circuit_breakers: unhealthy"));

    let metrics = ctx.health().metrics_all().await;
    assert_eq!(metrics["circuit_breakers"]["payments"]["state"], "open");
    assert_eq!(metrics["rate_limiter"]["tracked_keys"], 0);

    ctx.shutdown().await;
}
