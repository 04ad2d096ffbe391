//! HealthAggregator - one verdict across every registered component.
//!
//! Components are queried concurrently. Each check is bounded by a timeout
//! and guarded against panics; any failure is reported as `unhealthy` for
//! that component instead of failing the whole snapshot.

use futures::future::join_all;
use futures::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::foundation::{read, write};
use crate::domain::health::{ComponentHealth, ComponentReport, HealthSnapshot, OverallStatus};
use crate::ports::{HealthCheckError, HealthCheckable};

/// Aggregates health and metrics across components.
pub struct HealthAggregator {
    components: RwLock<Vec<Arc<dyn HealthCheckable>>>,
    check_timeout: Duration,
}

/// Handle to a running background monitor.
pub struct HealthMonitor {
    latest: watch::Receiver<Option<HealthSnapshot>>,
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    /// Most recent snapshot, `None` before the first check completes.
    pub fn latest(&self) -> Option<HealthSnapshot> {
        self.latest.borrow().clone()
    }

    /// Receiver notified on every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<HealthSnapshot>> {
        self.latest.clone()
    }

    pub fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }
}

impl HealthAggregator {
    pub fn new(check_timeout: Duration) -> Self {
        Self {
            components: RwLock::new(Vec::new()),
            check_timeout,
        }
    }

    /// Register a component. A component with the same name replaces the
    /// earlier registration.
    pub fn register(&self, component: Arc<dyn HealthCheckable>) {
        let mut components = write(&self.components);
        let name = component.component_name().to_string();
        if let Some(existing) = components.iter_mut().find(|c| c.component_name() == name) {
            tracing::debug!(component = %name, "Replacing registered health component");
            *existing = component;
        } else {
            components.push(component);
        }
    }

    /// Registered component names, in registration order.
    pub fn component_names(&self) -> Vec<String> {
        read(&self.components)
            .iter()
            .map(|c| c.component_name().to_string())
            .collect()
    }

    pub async fn health_check_all(&self) -> HealthSnapshot {
        let checks = self.snapshot().into_iter().map(|component| async move {
            let started = Instant::now();
            let health = match self.guarded(component.health()).await {
                Ok(health) => health,
                Err(e) => ComponentHealth::unhealthy(json!({ "error": e.to_string() })),
            };
            let latency_ms = started.elapsed().as_millis() as u64;
            (
                component.component_name().to_string(),
                ComponentReport::from_health(health, latency_ms),
            )
        });

        HealthSnapshot::from_reports(join_all(checks).await)
    }

    /// Metrics from every component, keyed by name. A failed component
    /// contributes `{"error": "..."}`.
    pub async fn metrics_all(&self) -> BTreeMap<String, Value> {
        let calls = self.snapshot().into_iter().map(|component| async move {
            let metrics = match self.guarded(component.metrics()).await {
                Ok(metrics) => metrics,
                Err(e) => json!({ "error": e.to_string() }),
            };
            (component.component_name().to_string(), metrics)
        });

        join_all(calls).await.into_iter().collect()
    }

    /// Run `health_check_all` every `interval` until `shutdown` turns true.
    ///
    /// The latest snapshot is published through a watch channel; changes of
    /// the overall status are logged.
    pub fn spawn_monitor(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> HealthMonitor {
        let (tx, latest) = watch::channel(None);
        let aggregator = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last_status: Option<OverallStatus> = None;

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {
                        let snapshot = aggregator.health_check_all().await;
                        log_transition(last_status, &snapshot);
                        last_status = Some(snapshot.overall);
                        tx.send_replace(Some(snapshot));
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Health monitor stopped");
        });

        HealthMonitor { latest, handle }
    }

    fn snapshot(&self) -> Vec<Arc<dyn HealthCheckable>> {
        read(&self.components).clone()
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, HealthCheckError>
    where
        F: Future<Output = Result<T, HealthCheckError>>,
    {
        match tokio::time::timeout(self.check_timeout, AssertUnwindSafe(call).catch_unwind()).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(HealthCheckError::Panicked(panic_message(panic))),
            Err(_) => Err(HealthCheckError::Timeout(self.check_timeout)),
        }
    }
}

impl std::fmt::Debug for HealthAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthAggregator")
            .field("components", &self.component_names())
            .field("check_timeout", &self.check_timeout)
            .finish()
    }
}

fn log_transition(previous: Option<OverallStatus>, snapshot: &HealthSnapshot) {
    if previous == Some(snapshot.overall) {
        return;
    }
    match snapshot.overall {
        OverallStatus::Healthy => {
            tracing::info!(status = %snapshot.overall, "System health changed")
        }
        _ => tracing::warn!(
            status = %snapshot.overall,
            issues = ?snapshot.issues,
            "System health changed"
        ),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::ComponentStatus;
    use async_trait::async_trait;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    enum Behaviour {
        Report(ComponentStatus),
        Fail,
        Hang,
        Panic,
    }

    struct MockComponent {
        name: &'static str,
        behaviour: Behaviour,
    }

    impl MockComponent {
        fn arc(name: &'static str, behaviour: Behaviour) -> Arc<dyn HealthCheckable> {
            Arc::new(Self { name, behaviour })
        }
    }

    #[async_trait]
    impl HealthCheckable for MockComponent {
        fn component_name(&self) -> &str {
            self.name
        }

        async fn health(&self) -> Result<ComponentHealth, HealthCheckError> {
            match self.behaviour {
                Behaviour::Report(status) => Ok(ComponentHealth::new(status, json!({}))),
                Behaviour::Fail => Err(HealthCheckError::Failed("connection refused".to_string())),
                Behaviour::Hang => std::future::pending().await,
                Behaviour::Panic => panic!("probe exploded"),
            }
        }

        async fn metrics(&self) -> Result<Value, HealthCheckError> {
            match self.behaviour {
                Behaviour::Fail => Err(HealthCheckError::Failed("no metrics".to_string())),
                _ => Ok(json!({ "calls": 1 })),
            }
        }
    }

    fn aggregator(components: Vec<Arc<dyn HealthCheckable>>) -> HealthAggregator {
        let aggregator = HealthAggregator::new(Duration::from_millis(100));
        for c in components {
            aggregator.register(c);
        }
        aggregator
    }

    fn healthy(name: &'static str) -> Arc<dyn HealthCheckable> {
        MockComponent::arc(name, Behaviour::Report(ComponentStatus::Healthy))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn no_components_is_healthy() {
        let snapshot = aggregator(vec![]).health_check_all().await;
        assert_eq!(snapshot.overall, OverallStatus::Healthy);
        assert!(snapshot.components.is_empty());
    }

    #[tokio::test]
    async fn one_of_four_unhealthy_is_degraded() {
        let snapshot = aggregator(vec![
            healthy("a"),
            healthy("b"),
            healthy("c"),
            MockComponent::arc("d", Behaviour::Fail),
        ])
        .health_check_all()
        .await;

        assert_eq!(snapshot.overall, OverallStatus::Degraded);
        assert_eq!(snapshot.components["d"].status, ComponentStatus::Unhealthy);
        assert_eq!(snapshot.issues.len(), 1);
        assert!(snapshot.issues[0].starts_with("d: unhealthy"));
    }

    #[tokio::test]
    async fn three_of_four_unhealthy_is_critical() {
        let snapshot = aggregator(vec![
            healthy("a"),
            MockComponent::arc("b", Behaviour::Fail),
            MockComponent::arc("c", Behaviour::Fail),
            MockComponent::arc("d", Behaviour::Report(ComponentStatus::Unhealthy)),
        ])
        .health_check_all()
        .await;

        assert_eq!(snapshot.overall, OverallStatus::Critical);
        assert_eq!(snapshot.issues.len(), 3);
    }

    #[tokio::test]
    async fn degraded_component_is_listed_without_lowering_overall() {
        let snapshot = aggregator(vec![
            healthy("a"),
            MockComponent::arc("cache", Behaviour::Report(ComponentStatus::Degraded)),
        ])
        .health_check_all()
        .await;

        assert_eq!(snapshot.overall, OverallStatus::Healthy);
        assert_eq!(snapshot.components["cache"].status, ComponentStatus::Degraded);
        assert_eq!(snapshot.issues.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_and_panicking_checks_are_unhealthy() {
        let snapshot = aggregator(vec![
            healthy("a"),
            healthy("b"),
            MockComponent::arc("slow", Behaviour::Hang),
            MockComponent::arc("buggy", Behaviour::Panic),
        ])
        .health_check_all()
        .await;

        assert_eq!(snapshot.overall, OverallStatus::Critical);
        let slow = &snapshot.components["slow"];
        assert_eq!(slow.status, ComponentStatus::Unhealthy);
        assert!(slow.detail["error"].as_str().unwrap().contains("timed out"));
        let buggy = &snapshot.components["buggy"];
        assert!(buggy.detail["error"].as_str().unwrap().contains("probe exploded"));
    }

    #[tokio::test]
    async fn metrics_failures_are_recorded_per_component() {
        let metrics = aggregator(vec![healthy("a"), MockComponent::arc("b", Behaviour::Fail)])
            .metrics_all()
            .await;

        assert_eq!(metrics["a"]["calls"], 1);
        assert_eq!(metrics["b"]["error"], "health check failed: no metrics");
    }

    #[test]
    fn registering_same_name_replaces() {
        let aggregator = aggregator(vec![
            healthy("a"),
            MockComponent::arc("a", Behaviour::Fail),
        ]);
        assert_eq!(aggregator.component_names(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_publishes_snapshots_until_shutdown() {
        let aggregator = Arc::new(aggregator(vec![healthy("a")]));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let monitor = aggregator.spawn_monitor(Duration::from_secs(30), shutdown_rx);
        let mut updates = monitor.subscribe();
        updates.changed().await.unwrap();

        let latest = monitor.latest().unwrap();
        assert_eq!(latest.overall, OverallStatus::Healthy);

        shutdown_tx.send(true).unwrap();
        monitor.into_handle().await.unwrap();
    }
}
