//! CircuitBreakerRegistry - one breaker per named dependency.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use super::CircuitBreaker;
use crate::domain::circuit::{CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
use crate::domain::foundation::{read, write};
use crate::domain::health::{ComponentHealth, OverallStatus};
use crate::ports::{HealthCheckError, HealthCheckable};

/// Breaker counts by state plus the derived verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerHealthSummary {
    pub status: OverallStatus,
    pub total: usize,
    pub closed: usize,
    pub open: usize,
    pub half_open: usize,
    /// Names of open circuits, sorted
    pub open_circuits: Vec<String>,
}

/// Name → breaker map shared by every caller in the process.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the breaker registered under `name`, creating it with
    /// `config` on first use. Later configs for the same name are ignored.
    pub fn get_or_create(&self, name: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        if let Some(existing) = read(&self.breakers).get(name) {
            Self::note_ignored_config(existing, &config);
            return existing.clone();
        }

        let mut breakers = write(&self.breakers);
        if let Some(existing) = breakers.get(name) {
            Self::note_ignored_config(existing, &config);
            return existing.clone();
        }

        let breaker = Arc::new(CircuitBreaker::new(name, config));
        breakers.insert(name.to_string(), breaker.clone());
        tracing::debug!(breaker = %name, "Registered circuit breaker");
        breaker
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        read(&self.breakers).get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.breakers).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        read(&self.breakers).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.breakers).is_empty()
    }

    pub fn reset_all(&self) {
        for breaker in self.snapshot() {
            breaker.reset();
        }
    }

    pub fn health_summary(&self) -> BreakerHealthSummary {
        let mut closed = 0;
        let mut half_open = 0;
        let mut open_circuits = Vec::new();

        let breakers = self.snapshot();
        for breaker in &breakers {
            match breaker.state() {
                CircuitState::Closed => closed += 1,
                CircuitState::HalfOpen => half_open += 1,
                CircuitState::Open => open_circuits.push(breaker.name().to_string()),
            }
        }
        open_circuits.sort();

        let open = open_circuits.len();
        BreakerHealthSummary {
            status: OverallStatus::from_circuit_counts(open, half_open, breakers.len()),
            total: breakers.len(),
            closed,
            open,
            half_open,
            open_circuits,
        }
    }

    pub fn all_stats(&self) -> BTreeMap<String, CircuitBreakerStats> {
        self.snapshot()
            .into_iter()
            .map(|b| (b.name().to_string(), b.stats()))
            .collect()
    }

    // Clone out the breakers so no registry lock is held while they are inspected.
    fn snapshot(&self) -> Vec<Arc<CircuitBreaker>> {
        read(&self.breakers).values().cloned().collect()
    }

    fn note_ignored_config(existing: &CircuitBreaker, requested: &CircuitBreakerConfig) {
        if existing.config() != *requested {
            tracing::debug!(
                breaker = %existing.name(),
                "Circuit breaker already registered, ignoring differing config"
            );
        }
    }
}

#[async_trait]
impl HealthCheckable for CircuitBreakerRegistry {
    fn component_name(&self) -> &str {
        "circuit_breakers"
    }

    async fn health(&self) -> Result<ComponentHealth, HealthCheckError> {
        let summary = self.health_summary();
        let status = summary.status.as_component_status();
        let detail =
            serde_json::to_value(&summary).map_err(|e| HealthCheckError::Failed(e.to_string()))?;
        Ok(ComponentHealth::new(status, detail))
    }

    async fn metrics(&self) -> Result<Value, HealthCheckError> {
        serde_json::to_value(self.all_stats()).map_err(|e| HealthCheckError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::ComponentStatus;
    use std::time::Duration;

    async fn trip(breaker: &CircuitBreaker) {
        for _ in 0..breaker.config().failure_threshold {
            let _ = breaker.call(async { Err::<(), _>("down") }).await;
        }
    }

    #[test]
    fn get_or_create_is_idempotent_and_first_config_wins() {
        let registry = CircuitBreakerRegistry::new();
        let slow = CircuitBreakerConfig::default()
            .with_failure_threshold(3)
            .with_call_timeout(Duration::from_secs(60));
        let first = registry.get_or_create("llm", slow.clone());
        let second = registry.get_or_create("llm", CircuitBreakerConfig::default());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config(), slow);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_sorted() {
        let registry = CircuitBreakerRegistry::new();
        registry.get_or_create("search", CircuitBreakerConfig::default());
        registry.get_or_create("llm", CircuitBreakerConfig::default());

        assert_eq!(registry.names(), vec!["llm", "search"]);
        assert!(registry.get("search").is_some());
        assert!(registry.get("payments").is_none());
    }

    #[test]
    fn empty_registry_is_healthy() {
        let summary = CircuitBreakerRegistry::new().health_summary();
        assert_eq!(summary.status, OverallStatus::Healthy);
        assert_eq!(summary.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn one_open_of_four_is_degraded() {
        let registry = CircuitBreakerRegistry::new();
        for name in ["a", "b", "c", "d"] {
            registry.get_or_create(name, CircuitBreakerConfig::default().with_failure_threshold(1));
        }
        trip(&registry.get("a").unwrap()).await;

        let summary = registry.health_summary();
        assert_eq!(summary.status, OverallStatus::Degraded);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.open_circuits, vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_circuit_degrades() {
        let registry = CircuitBreakerRegistry::new();
        let config = CircuitBreakerConfig::default()
            .with_failure_threshold(1)
            .with_recovery_timeout(Duration::from_secs(5))
            .with_success_threshold(2);
        let a = registry.get_or_create("a", config.clone());
        registry.get_or_create("b", config);
        trip(&a).await;
        tokio::time::advance(Duration::from_secs(5)).await;
        a.call(async { Ok::<_, &str>(()) }).await.unwrap();

        let summary = registry.health_summary();
        assert_eq!(summary.half_open, 1);
        assert_eq!(summary.status, OverallStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn half_of_circuits_open_is_critical_and_reported_unhealthy() {
        let registry = CircuitBreakerRegistry::new();
        for name in ["a", "b"] {
            registry.get_or_create(name, CircuitBreakerConfig::default().with_failure_threshold(1));
        }
        trip(&registry.get("b").unwrap()).await;

        assert_eq!(registry.health_summary().status, OverallStatus::Critical);
        let health = registry.health().await.unwrap();
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert_eq!(health.detail["open"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_all_closes_every_breaker() {
        let registry = CircuitBreakerRegistry::new();
        for name in ["a", "b"] {
            let breaker =
                registry.get_or_create(name, CircuitBreakerConfig::default().with_failure_threshold(1));
            trip(&breaker).await;
        }

        registry.reset_all();

        assert_eq!(registry.health_summary().status, OverallStatus::Healthy);
    }

    #[tokio::test]
    async fn metrics_are_keyed_by_breaker_name() {
        let registry = CircuitBreakerRegistry::new();
        registry.get_or_create("llm", CircuitBreakerConfig::default());

        let metrics = registry.metrics().await.unwrap();
        assert_eq!(metrics["llm"]["state"], "closed");
        assert_eq!(metrics["llm"]["total_calls"], 0);
    }
}
