//! # Flat Service Dependency Check
//!
//! Composite over an explicit *list* of resolved sub-checks. All sub-checks
//! are evaluated concurrently; order carries no meaning here, only the
//! aggregate verdict does.
//!
//! Reporting asymmetry, preserved deliberately: a sub-check whose evaluation
//! *raised* (panic or timeout, reported with `Error` status) is excluded from the
//! `details.dependencies` map but still counted in `failed_dependencies`,
//! and its error text still feeds the aggregate's warnings/error.

use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::aggregator::{aggregate, AggregateEntry};
use crate::constants::{check_types, DEFAULT_CHECK_TIMEOUT};
use crate::executor::CheckExecutor;
use crate::metrics::{MetricsSink, NoopMetricsSink};
use crate::types::{HealthCheck, HealthCheckResult, HealthStatus};

/// Composite check over a fixed list of sub-checks.
pub struct ServiceDependencyCheck {
    name: String,
    required: bool,
    timeout: Duration,
    sub_checks: Vec<Arc<dyn HealthCheck>>,
    executor: CheckExecutor,
    metrics: Arc<dyn MetricsSink>,
}

impl ServiceDependencyCheck {
    pub fn new(name: impl Into<String>, sub_checks: Vec<Arc<dyn HealthCheck>>) -> Self {
        Self {
            name: name.into(),
            required: true,
            timeout: DEFAULT_CHECK_TIMEOUT,
            sub_checks,
            executor: CheckExecutor::new(),
            metrics: Arc::new(NoopMetricsSink),
        }
    }

    /// Whether any failed sub-check escalates this composite to unhealthy
    /// (required) or only to warning (optional).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_executor(mut self, executor: CheckExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }
}

#[async_trait::async_trait]
impl HealthCheck for ServiceDependencyCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_type(&self) -> &str {
        check_types::SERVICE_DEPENDENCY
    }

    fn required(&self) -> bool {
        self.required
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn check_health(&self) -> HealthCheckResult {
        let evaluations = self.sub_checks.iter().map(|check| {
            let executor = self.executor.clone();
            let check = check.clone();
            async move {
                let name = check.name().to_string();
                let result = executor.execute(check).await;
                (name, result)
            }
        });
        let outcomes: Vec<(String, HealthCheckResult)> = join_all(evaluations).await;

        let mut dependencies = serde_json::Map::new();
        let mut failed = 0usize;
        let mut entries = Vec::with_capacity(outcomes.len());

        for (name, result) in &outcomes {
            if result.is_failure() {
                failed += 1;
            }
            // Raised sub-checks are counted but not listed.
            if result.status != HealthStatus::Error {
                dependencies.insert(
                    name.clone(),
                    json!({
                        "status": result.status.as_str(),
                        "error": result.error,
                        "warnings": result.warnings,
                    }),
                );
            }
            entries.push(AggregateEntry::from_result(name, result, self.required));
        }

        let rolled = aggregate(&entries);
        debug!(
            check = %self.name,
            total = outcomes.len(),
            failed = failed,
            status = %rolled.status,
            "Service dependency check aggregated"
        );
        self.metrics
            .record_service(&self.name, rolled.status.is_healthy());

        let mut result = HealthCheckResult::healthy();
        result.status = rolled.status;
        result.error = rolled.error;
        result.warnings = rolled.warnings;
        result
            .details
            .insert("total_dependencies".to_string(), json!(outcomes.len()));
        result
            .details
            .insert("failed_dependencies".to_string(), json!(failed));
        result.details.insert(
            "dependencies".to_string(),
            serde_json::Value::Object(dependencies),
        );
        result
    }
}
