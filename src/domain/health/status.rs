//! Health verdicts for single components and for the whole process.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Status reported by one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Healthy,
    /// Working, with reduced capability (e.g. cache running local-only).
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Healthy => "healthy",
            ComponentStatus::Degraded => "degraded",
            ComponentStatus::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status across a set of components or circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Critical,
}

impl OverallStatus {
    /// Verdict over health-checked components.
    ///
    /// Critical when at least half are unhealthy, degraded when some are,
    /// healthy otherwise (including no components at all). Degraded
    /// components are still serving and do not count against the verdict.
    pub fn from_component_counts(unhealthy: usize, total: usize) -> Self {
        if total == 0 {
            return OverallStatus::Healthy;
        }
        if unhealthy * 2 >= total && unhealthy > 0 {
            OverallStatus::Critical
        } else if unhealthy > 0 {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        }
    }

    /// Verdict over circuit breakers.
    ///
    /// Critical when at least half are open, degraded when any is open or
    /// half-open, healthy otherwise.
    pub fn from_circuit_counts(open: usize, half_open: usize, total: usize) -> Self {
        if total == 0 {
            return OverallStatus::Healthy;
        }
        if open > 0 && open * 2 >= total {
            OverallStatus::Critical
        } else if open > 0 || half_open > 0 {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        }
    }

    pub fn as_component_status(&self) -> ComponentStatus {
        match self {
            OverallStatus::Healthy => ComponentStatus::Healthy,
            OverallStatus::Degraded => ComponentStatus::Degraded,
            OverallStatus::Critical => ComponentStatus::Unhealthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a component returns from its health check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub detail: Value,
}

impl ComponentHealth {
    pub fn new(status: ComponentStatus, detail: Value) -> Self {
        Self { status, detail }
    }

    pub fn healthy(detail: Value) -> Self {
        Self::new(ComponentStatus::Healthy, detail)
    }

    pub fn degraded(detail: Value) -> Self {
        Self::new(ComponentStatus::Degraded, detail)
    }

    pub fn unhealthy(detail: Value) -> Self {
        Self::new(ComponentStatus::Unhealthy, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_of_four_unhealthy_is_degraded() {
        assert_eq!(
            OverallStatus::from_component_counts(1, 4),
            OverallStatus::Degraded
        );
    }

    #[test]
    fn three_of_four_unhealthy_is_critical() {
        assert_eq!(
            OverallStatus::from_component_counts(3, 4),
            OverallStatus::Critical
        );
    }

    #[test]
    fn exactly_half_unhealthy_is_critical() {
        assert_eq!(
            OverallStatus::from_component_counts(2, 4),
            OverallStatus::Critical
        );
    }

    #[test]
    fn no_components_is_healthy() {
        assert_eq!(
            OverallStatus::from_component_counts(0, 0),
            OverallStatus::Healthy
        );
    }

    #[test]
    fn half_open_only_is_degraded() {
        assert_eq!(
            OverallStatus::from_circuit_counts(0, 1, 5),
            OverallStatus::Degraded
        );
    }

    #[test]
    fn minority_open_is_degraded_majority_is_critical() {
        assert_eq!(
            OverallStatus::from_circuit_counts(1, 0, 3),
            OverallStatus::Degraded
        );
        assert_eq!(
            OverallStatus::from_circuit_counts(2, 0, 4),
            OverallStatus::Critical
        );
    }

    #[test]
    fn critical_maps_to_unhealthy_component() {
        assert_eq!(
            OverallStatus::Critical.as_component_status(),
            ComponentStatus::Unhealthy
        );
    }
}
