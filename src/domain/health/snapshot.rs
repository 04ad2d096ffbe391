//! Point-in-time health snapshot across all registered components.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{ComponentHealth, ComponentStatus, OverallStatus};
use crate::domain::foundation::Timestamp;

/// One component's entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub status: ComponentStatus,
    pub detail: Value,
    pub latency_ms: u64,
}

impl ComponentReport {
    pub fn from_health(health: ComponentHealth, latency_ms: u64) -> Self {
        Self {
            status: health.status,
            detail: health.detail,
            latency_ms,
        }
    }
}

/// Generated on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub overall: OverallStatus,
    pub components: BTreeMap<String, ComponentReport>,
    pub issues: Vec<String>,
    pub generated_at: Timestamp,
}

impl HealthSnapshot {
    pub fn from_reports(reports: impl IntoIterator<Item = (String, ComponentReport)>) -> Self {
        let components: BTreeMap<String, ComponentReport> = reports.into_iter().collect();

        let mut unhealthy = 0;
        let mut issues = Vec::new();
        for (name, report) in &components {
            match report.status {
                ComponentStatus::Healthy => continue,
                ComponentStatus::Degraded => {}
                ComponentStatus::Unhealthy => unhealthy += 1,
            }
            issues.push(format!("{}: {} ({})", name, report.status, summarize(&report.detail)));
        }

        Self {
            overall: OverallStatus::from_component_counts(unhealthy, components.len()),
            components,
            issues,
            generated_at: Timestamp::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall == OverallStatus::Healthy
    }
}

fn summarize(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("error").or_else(|| map.get("reason")) {
            Some(Value::String(s)) => s.clone(),
            _ => detail.to_string(),
        },
        other => other.to_string(),
    }
}
