//! Integration tests for health aggregation across real components.
//!
//! The registry, rate limiter and cache report their own health; a stub
//! dependency fills the fourth slot so the 1-of-4 and 3-of-4 thresholds can
//! be driven from real component state.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resilience_core::adapters::cache::InMemoryCacheStore;
use resilience_core::adapters::rate_limiter::{RateLimitConfig, SlidingWindowRateLimiter};
use resilience_core::application::{CircuitBreakerRegistry, HealthAggregator, MultiTierCache};
use resilience_core::config::CacheConfig;
use resilience_core::domain::circuit::CircuitBreakerConfig;
use resilience_core::domain::health::{ComponentHealth, ComponentStatus, OverallStatus};
use resilience_core::ports::{HealthCheckError, HealthCheckable};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// A downstream dependency whose reachability the test controls.
struct StubDependency {
    up: AtomicBool,
}

impl StubDependency {
    fn new() -> Self {
        Self {
            up: AtomicBool::new(true),
        }
    }

    fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthCheckable for StubDependency {
    fn component_name(&self) -> &str {
        "ledger"
    }

    async fn health(&self) -> Result<ComponentHealth, HealthCheckError> {
        if self.up.load(Ordering::SeqCst) {
            Ok(ComponentHealth::healthy(json!({})))
        } else {
            Err(HealthCheckError::Failed("connection refused".to_string()))
        }
    }
}

/// A rate limiter that reports itself unhealthy.
struct BrokenProbe;

#[async_trait]
impl HealthCheckable for BrokenProbe {
    fn component_name(&self) -> &str {
        "rate_limiter"
    }

    async fn health(&self) -> Result<ComponentHealth, HealthCheckError> {
        Ok(ComponentHealth::unhealthy(json!({ "error": "probe failed" })))
    }
}

struct Fixture {
    aggregator: HealthAggregator,
    registry: Arc<CircuitBreakerRegistry>,
    remote: Arc<InMemoryCacheStore>,
    ledger: Arc<StubDependency>,
}

fn fixture() -> Fixture {
    let registry = Arc::new(CircuitBreakerRegistry::new());
    registry.get_or_create("payments", CircuitBreakerConfig::default().with_failure_threshold(1));

    let remote = Arc::new(InMemoryCacheStore::new());
    let cache = Arc::new(MultiTierCache::new(&CacheConfig::default()).with_remote(remote.clone()));
    let limiter = Arc::new(SlidingWindowRateLimiter::new(RateLimitConfig::default()));
    let ledger = Arc::new(StubDependency::new());

    let aggregator = HealthAggregator::new(Duration::from_secs(1));
    aggregator.register(registry.clone());
    aggregator.register(limiter);
    aggregator.register(cache);
    aggregator.register(ledger.clone());

    Fixture {
        aggregator,
        registry,
        remote,
        ledger,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn all_components_healthy() {
    let f = fixture();
    let snapshot = f.aggregator.health_check_all().await;

    assert_eq!(snapshot.overall, OverallStatus::Healthy);
    assert_eq!(snapshot.components.len(), 4);
    assert!(snapshot.issues.is_empty());
}

#[tokio::test]
async fn one_of_four_unhealthy_is_degraded() {
    let f = fixture();
    f.ledger.set_up(false);

    let snapshot = f.aggregator.health_check_all().await;

    assert_eq!(snapshot.overall, OverallStatus::Degraded);
    assert_eq!(snapshot.components["ledger"].status, ComponentStatus::Unhealthy);
    assert_eq!(snapshot.issues, vec!["ledger: unhealthy (health check failed: connection refused)"]);
}

#[tokio::test]
async fn three_of_four_unhealthy_is_critical() {
    let f = fixture();
    f.ledger.set_up(false);
    let payments = f.registry.get("payments").unwrap();
    let _ = payments.call(async { Err::<(), _>("gateway down") }).await;
    f.aggregator.register(Arc::new(BrokenProbe));

    let snapshot = f.aggregator.health_check_all().await;

    assert_eq!(snapshot.overall, OverallStatus::Critical);
    assert_eq!(snapshot.components["circuit_breakers"].status, ComponentStatus::Unhealthy);
    assert_eq!(snapshot.components["cache"].status, ComponentStatus::Healthy);
    assert_eq!(snapshot.issues.len(), 3);
}

#[tokio::test]
async fn unreachable_remote_cache_degrades_without_failing() {
    let f = fixture();
    f.remote.set_offline(true);

    let snapshot = f.aggregator.health_check_all().await;

    assert_eq!(snapshot.overall, OverallStatus::Healthy);
    let cache = &snapshot.components["cache"];
    assert_eq!(cache.status, ComponentStatus::Degraded);
    assert_eq!(cache.detail["mode"], "local_only");
    assert_eq!(snapshot.issues.len(), 1);
    assert!(snapshot.issues[0].starts_with("cache: degraded"));
}

#[tokio::test]
async fn snapshot_serializes_for_health_endpoints() {
    let f = fixture();
    f.ledger.set_up(false);

    let snapshot = f.aggregator.health_check_all().await;
    let body = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(body["overall"], "degraded");
    assert_eq!(body["components"]["ledger"]["status"], "unhealthy");
    assert!(body["generated_at"].is_string());
}
