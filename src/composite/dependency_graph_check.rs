//! # Service Dependency Graph Check
//!
//! Composite over an explicit dependency graph: service -> set of services
//! it depends on, plus one check per service (the check map may be a strict
//! subset of the services named in the graph).
//!
//! Evaluation computes a topological order with Kahn's algorithm (bounded,
//! deterministic since ready nodes are taken in lexicographic order), fails with
//! a "cycle detected" result before invoking anything if the graph is not a
//! DAG, then executes checks in dependency order. The order itself is the
//! gating mechanism: a service never runs before its dependencies completed.

use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::aggregator::{aggregate, AggregateEntry};
use crate::constants::{check_types, DEFAULT_CHECK_TIMEOUT};
use crate::error::{HealthCheckError, HealthResult};
use crate::executor::CheckExecutor;
use crate::metrics::{MetricsSink, NoopMetricsSink};
use crate::types::{HealthCheck, HealthCheckResult, HealthStatus};

/// Composite check over an explicit service dependency graph.
pub struct ServiceDependencyGraphCheck {
    name: String,
    required: bool,
    timeout: Duration,
    /// service -> services it depends on.
    adjacency: HashMap<String, HashSet<String>>,
    /// service -> its check; may omit services named in `adjacency`.
    checks: HashMap<String, Arc<dyn HealthCheck>>,
    executor: CheckExecutor,
    metrics: Arc<dyn MetricsSink>,
}

impl ServiceDependencyGraphCheck {
    pub fn new(
        name: impl Into<String>,
        adjacency: HashMap<String, HashSet<String>>,
        checks: HashMap<String, Arc<dyn HealthCheck>>,
    ) -> Self {
        Self {
            name: name.into(),
            required: true,
            timeout: DEFAULT_CHECK_TIMEOUT,
            adjacency,
            checks,
            executor: CheckExecutor::new(),
            metrics: Arc::new(NoopMetricsSink),
        }
    }

    /// Whether any failed service escalates this composite to unhealthy
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

    /// The raw adjacency, serialized deterministically (sorted).
    fn adjacency_detail(&self) -> serde_json::Value {
        let sorted: BTreeMap<&str, Vec<&str>> = self
            .adjacency
            .iter()
            .map(|(service, deps)| {
                let mut deps: Vec<&str> = deps.iter().map(String::as_str).collect();
                deps.sort_unstable();
                (service.as_str(), deps)
            })
            .collect();
        json!(sorted)
    }
}

/// Compute a total order over the graph's services such that every service
/// appears after all of its dependencies.
///
/// Kahn's algorithm over in-degree counts; ready services are consumed in
/// lexicographic order so the result is deterministic. Services referenced
/// only as dependencies participate as nodes too.
pub fn topological_order(
    adjacency: &HashMap<String, HashSet<String>>,
) -> HealthResult<Vec<String>> {
    let mut nodes: BTreeSet<String> = adjacency.keys().cloned().collect();
    for dependencies in adjacency.values() {
        nodes.extend(dependencies.iter().cloned());
    }

    // pending[n] = number of unmet dependencies of n.
    let mut pending: BTreeMap<String, usize> = nodes.iter().map(|n| (n.clone(), 0)).collect();
    let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (service, dependencies) in adjacency {
        for dependency in dependencies {
            *pending.get_mut(service).expect("service is a node") += 1;
            dependents
                .entry(dependency.clone())
                .or_default()
                .push(service.clone());
        }
    }

    let mut ready: BTreeSet<String> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| name.clone())
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(next) = ready.iter().next().cloned() {
        ready.remove(&next);
        if let Some(children) = dependents.get(&next) {
            for child in children {
                let count = pending.get_mut(child).expect("child is a node");
                *count -= 1;
                if *count == 0 {
                    ready.insert(child.clone());
                }
            }
        }
        order.push(next);
    }

    if order.len() < nodes.len() {
        let mut remaining: Vec<String> = pending
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, _)| name)
            .collect();
        remaining.sort();
        return Err(HealthCheckError::CycleDetected { nodes: remaining });
    }

    Ok(order)
}

#[async_trait::async_trait]
impl HealthCheck for ServiceDependencyGraphCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_type(&self) -> &str {
        check_types::SERVICE_DEPENDENCY_GRAPH
    }

    fn required(&self) -> bool {
        self.required
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn check_health(&self) -> HealthCheckResult {
        let order = match topological_order(&self.adjacency) {
            Ok(order) => order,
            Err(cycle) => {
                warn!(check = %self.name, error = %cycle, "Dependency graph is cyclic");
                self.metrics.record_service(&self.name, false);
                return HealthCheckResult::unhealthy(cycle.to_string())
                    .with_detail("dependencies", self.adjacency_detail());
            }
        };

        debug!(check = %self.name, order = ?order, "Resolved service execution order");

        let mut services = serde_json::Map::new();
        let mut entries: Vec<AggregateEntry> = Vec::with_capacity(order.len());
        let mut failed = 0usize;

        for service in &order {
            let Some(check) = self.checks.get(service) else {
                // A service with no check is tolerated, even when the
                // composite itself is required.
                let message = format!("No health check for service: {service}");
                warn!(check = %self.name, service = %service, "{message}");
                let mut entry =
                    AggregateEntry::new(service.clone(), HealthStatus::Warning, self.required);
                entry.warnings.push(message);
                entries.push(entry);
                continue;
            };

            let result = self.executor.execute(check.clone()).await;
            if result.is_failure() {
                failed += 1;
            }
            self.metrics.record_service(service, result.is_healthy());
            services.insert(
                service.clone(),
                json!({
                    "status": result.status.as_str(),
                    "error": result.error,
                    "warnings": result.warnings,
                }),
            );
            entries.push(AggregateEntry::from_result(service, &result, self.required));
        }

        let rolled = aggregate(&entries);
        self.metrics
            .record_service(&self.name, rolled.status.is_healthy());

        let mut result = HealthCheckResult::healthy();
        result.status = rolled.status;
        result.error = rolled.error;
        result.warnings = rolled.warnings;
        result
            .details
            .insert("total_services".to_string(), json!(order.len()));
        result
            .details
            .insert("failed_services".to_string(), json!(failed));
        result
            .details
            .insert("services".to_string(), serde_json::Value::Object(services));
        result
            .details
            .insert("execution_order".to_string(), json!(order));
        result
    }
}
