//! Rate limiting port for protecting upstream dependencies.
//!
//! Admission control is a sliding window log per key: a request is admitted
//! when fewer than the configured number of admissions fall inside the
//! trailing window. Rejection is a value, never an error; the HTTP layer
//! turns it into a 429 with `Retry-After`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// Port for rate limiting operations.
///
/// Implementations must be safe under concurrent use and evaluate
/// prune-check-append for one key as a single step.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check if a request is allowed, recording it if so.
    async fn check(&self, key: &RateLimitKey) -> RateLimitResult;

    /// Boolean form of [`RateLimiter::check`].
    async fn allow(&self, key: &RateLimitKey) -> bool {
        self.check(key).await.is_allowed()
    }

    /// When the oldest retained admission for `key` leaves the window.
    ///
    /// `None` when the key has no admissions in the window.
    async fn reset_time(&self, key: &RateLimitKey) -> Option<Instant>;

    /// Current status without recording a request.
    async fn status(&self, key: &RateLimitKey) -> RateLimitStatus;

    /// Forget all admissions for a key (admin operation).
    async fn reset(&self, key: &RateLimitKey);
}

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    /// The scope of this rate limit.
    pub scope: RateLimitScope,
    /// Identifier within the scope (e.g., IP address, user ID).
    pub identifier: String,
    /// Optional resource for finer-grained limits (e.g., "chat_completions").
    pub resource: Option<String>,
}

/// The scope at which rate limiting is applied.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// Global rate limit across all requests.
    Global,
    /// Per-client-IP rate limit.
    Ip,
    /// Per-authenticated-user rate limit.
    User,
    /// Per-resource rate limit (e.g., one upstream provider).
    Resource,
}

impl RateLimitKey {
    fn scoped(scope: RateLimitScope, identifier: impl Into<String>) -> Self {
        Self {
            scope,
            identifier: identifier.into(),
            resource: None,
        }
    }

    /// One shared quota for every caller.
    pub fn global() -> Self {
        Self::scoped(RateLimitScope::Global, "global")
    }

    pub fn ip(ip: &str) -> Self {
        Self::scoped(RateLimitScope::Ip, ip)
    }

    pub fn user(user_id: &str) -> Self {
        Self::scoped(RateLimitScope::User, user_id)
    }

    /// Quota shared by all callers of one resource (e.g. an upstream API).
    pub fn resource(resource: &str) -> Self {
        Self::scoped(RateLimitScope::Resource, resource)
    }

    /// Narrows this key to one resource.
    pub fn for_resource(mut self, resource: &str) -> Self {
        self.resource = Some(resource.to_string());
        self
    }

    /// Flat string form used as the map key.
    pub fn storage_key(&self) -> String {
        match &self.resource {
            Some(resource) => format!(
                "ratelimit:{}:{}:{}",
                self.scope.as_str(),
                self.identifier,
                resource
            ),
            None => format!("ratelimit:{}:{}", self.scope.as_str(), self.identifier),
        }
    }
}

impl RateLimitScope {
    /// Returns the string representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Global => "global",
            RateLimitScope::Ip => "ip",
            RateLimitScope::User => "user",
            RateLimitScope::Resource => "resource",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed; includes current status.
    Allowed(RateLimitStatus),
    /// Request is denied; includes denial details.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    /// Returns true if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    /// Returns true if the request was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// When the oldest admission leaves the window, if any.
    pub reset_at: Option<Instant>,
    /// Window duration in seconds.
    pub window_secs: u32,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Seconds until the client should retry (at least 1).
    pub retry_after_secs: u32,
    /// The scope that triggered the denial.
    pub scope: RateLimitScope,
    /// Human-readable message explaining the denial.
    pub message: String,
}
