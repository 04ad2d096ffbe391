//! Health capability port.
//!
//! Every component the aggregator watches implements this one trait; the
//! aggregator never inspects concrete types.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::domain::health::ComponentHealth;

#[async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Stable name used as the key in snapshots and metrics.
    fn component_name(&self) -> &str;

    async fn health(&self) -> Result<ComponentHealth, HealthCheckError>;

    /// Component metrics as JSON. Components without metrics report `{}`.
    async fn metrics(&self) -> Result<Value, HealthCheckError> {
        Ok(json!({}))
    }
}

/// Why a health or metrics probe produced no answer.
#[derive(Debug, Clone, Error)]
pub enum HealthCheckError {
    #[error("health check failed: {0}")]
    Failed(String),

    #[error("health check timed out after {0:?}")]
    Timeout(Duration),

    #[error("health check panicked: {0}")]
    Panicked(String),
}
