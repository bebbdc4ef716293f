//! # Core Types
//!
//! The fundamental data types shared across the orchestration engine: the
//! four-valued [`HealthStatus`], the [`HealthCheckResult`] every evaluation
//! produces, and the [`HealthCheck`] contract that leaf and composite checks
//! implement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{check_types, DEFAULT_CHECK_TIMEOUT};

/// Outcome status of a health check evaluation.
///
/// `Error` is reserved for check-*execution* failures (panic, timeout,
/// invocation error) and is distinct from a check's own `Unhealthy` verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Error => "error",
        }
    }

    /// Check if this status counts as a failure for aggregation purposes.
    pub fn is_failure(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy | HealthStatus::Error)
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one health check evaluation.
///
/// Invariant: `status == Healthy` implies `error` is `None`; `warnings` may
/// be non-empty even on a healthy result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    /// Set when status is `Unhealthy` or `Error`.
    pub error: Option<String>,
    /// Non-fatal issues, in the order they were observed.
    pub warnings: Vec<String>,
    /// Arbitrary descriptive values (per-dependency status, execution order).
    pub details: HashMap<String, serde_json::Value>,
    /// Numeric observations (counts, durations).
    pub metrics: HashMap<String, f64>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    fn with_status(status: HealthStatus, error: Option<String>) -> Self {
        Self {
            status,
            error,
            warnings: Vec::new(),
            details: HashMap::new(),
            metrics: HashMap::new(),
            checked_at: Utc::now(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(HealthStatus::Healthy, None)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        let mut result = Self::with_status(HealthStatus::Warning, None);
        result.warnings.push(message.into());
        result
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Unhealthy, Some(error.into()))
    }

    /// Synthetic result for a check whose *execution* failed (panic,
    /// timeout, invocation error), as opposed to a reported unhealthy verdict.
    pub fn execution_error(error: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Error, Some(error.into()))
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Human-readable reason for a non-healthy result, falling back to the
    /// status name when the check reported no message.
    pub fn reason(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| format!("status is {}", self.status))
    }
}

/// A named, typed unit of health evaluation.
///
/// Implementations are stateless per invocation and may be invoked
/// repeatedly. They should respect their own [`timeout`](Self::timeout);
/// callers additionally enforce a hard deadline around every invocation, so
/// an uncooperative check cannot hang a batch.
#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Free-form category string used for filtering.
    fn check_type(&self) -> &str {
        check_types::GENERIC
    }

    /// Whether a failure of this check escalates its parent to unhealthy
    /// (required) or only to warning (optional).
    fn required(&self) -> bool {
        true
    }

    /// Evaluation deadline for one invocation.
    fn timeout(&self) -> Duration {
        DEFAULT_CHECK_TIMEOUT
    }

    /// Names of other checks this one depends on. Only meaningful inside a
    /// [`HealthCheckRegistry`](crate::registry::HealthCheckRegistry).
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Evaluate the check. All failures the check itself can observe should
    /// be reported through the returned result, not by panicking.
    async fn check_health(&self) -> HealthCheckResult;
}
