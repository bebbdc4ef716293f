//! # Health Check Registry
//!
//! Flat store of named checks with derived reverse-dependency bookkeeping.
//!
//! Two evaluation paths with deliberately different semantics:
//!
//! - [`run_check`](HealthCheckRegistry::run_check) is *dependency-gated*:
//!   every declared dependency is resolved transitively and must come back
//!   healthy before the target check is invoked at all.
//! - [`run_all_checks`](HealthCheckRegistry::run_all_checks) is a bulk
//!   evaluation: every registered check runs directly and concurrently, with
//!   no gating between them, and the returned map always has one entry per
//!   evaluated check.
//!
//! The `checks` and `dependents` maps live behind one lock so every
//! register/unregister is atomic with respect to readers. Concurrent
//! registration and evaluation correctness assumes a single writer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{HealthCheckError, HealthResult};
use crate::executor::CheckExecutor;
use crate::types::{HealthCheck, HealthCheckResult};

/// Consolidated registry state behind a single lock.
#[derive(Default)]
struct RegistryState {
    checks: HashMap<String, Arc<dyn HealthCheck>>,
    /// name -> names of registered checks that declare a dependency on it.
    dependents: HashMap<String, HashSet<String>>,
}

/// Registry statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_checks: usize,
    pub checks_by_type: HashMap<String, usize>,
    pub check_names: Vec<String>,
}

/// Flat store of named health checks.
pub struct HealthCheckRegistry {
    state: Arc<RwLock<RegistryState>>,
    executor: CheckExecutor,
}

impl Default for HealthCheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthCheckRegistry {
    pub fn new() -> Self {
        Self::with_executor(CheckExecutor::new())
    }

    /// Create a registry that evaluates checks through the given executor.
    pub fn with_executor(executor: CheckExecutor) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
            executor,
        }
    }

    /// Register a check under its declared name.
    ///
    /// Dependency names may reference checks that are not registered yet;
    /// the edge bookkeeping is updated either way.
    pub async fn register(&self, check: Arc<dyn HealthCheck>) -> HealthResult<()> {
        let name = check.name().to_string();
        let dependencies = check.dependencies();

        let mut state = self.state.write().await;
        if state.checks.contains_key(&name) {
            return Err(HealthCheckError::AlreadyRegistered { name });
        }

        for dependency in &dependencies {
            state
                .dependents
                .entry(dependency.clone())
                .or_default()
                .insert(name.clone());
        }
        state.checks.insert(name.clone(), check);

        info!(
            check = %name,
            dependencies = ?dependencies,
            "Registered health check"
        );
        Ok(())
    }

    /// Remove a check, refusing while any registered check depends on it.
    pub async fn unregister(&self, name: &str) -> HealthResult<()> {
        let mut state = self.state.write().await;
        if !state.checks.contains_key(name) {
            return Err(HealthCheckError::NotRegistered {
                name: name.to_string(),
            });
        }

        if let Some(dependents) = state.dependents.get(name) {
            if !dependents.is_empty() {
                let mut names: Vec<String> = dependents.iter().cloned().collect();
                names.sort();
                warn!(
                    check = %name,
                    dependents = ?names,
                    "Refusing to unregister health check with dependents"
                );
                return Err(HealthCheckError::HasDependents {
                    name: name.to_string(),
                    dependents: names,
                });
            }
        }

        let removed = state.checks.remove(name);
        state.dependents.remove(name);
        // Clear this check's edges from every remaining dependency.
        if let Some(check) = removed {
            for dependency in check.dependencies() {
                if let Some(entry) = state.dependents.get_mut(&dependency) {
                    entry.remove(name);
                }
            }
        }

        info!(check = %name, "Unregistered health check");
        Ok(())
    }

    pub async fn get_check(&self, name: &str) -> HealthResult<Arc<dyn HealthCheck>> {
        let state = self.state.read().await;
        state
            .checks
            .get(name)
            .cloned()
            .ok_or_else(|| HealthCheckError::NotRegistered {
                name: name.to_string(),
            })
    }

    /// List registered checks, optionally restricted to one `check_type`,
    /// sorted by name.
    pub async fn list_checks(&self, type_filter: Option<&str>) -> Vec<Arc<dyn HealthCheck>> {
        let state = self.state.read().await;
        let mut checks: Vec<Arc<dyn HealthCheck>> = state
            .checks
            .values()
            .filter(|check| type_filter.map_or(true, |t| check.check_type() == t))
            .cloned()
            .collect();
        checks.sort_by(|a, b| a.name().cmp(b.name()));
        checks
    }

    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.read().await;
        let mut checks_by_type: HashMap<String, usize> = HashMap::new();
        for check in state.checks.values() {
            *checks_by_type
                .entry(check.check_type().to_string())
                .or_default() += 1;
        }
        let mut check_names: Vec<String> = state.checks.keys().cloned().collect();
        check_names.sort();
        RegistryStats {
            total_checks: state.checks.len(),
            checks_by_type,
            check_names,
        }
    }

    /// Evaluate one check after transitively resolving its declared
    /// dependencies, depth-first with each dependency evaluated exactly once.
    ///
    /// Any non-healthy dependency result fails the call with
    /// [`HealthCheckError::DependencyFailed`] before the target check is
    /// invoked. Remaining unresolved dependencies are short-circuited.
    pub async fn run_check(&self, name: &str) -> HealthResult<HealthCheckResult> {
        let snapshot = {
            let state = self.state.read().await;
            state.checks.clone()
        };

        let order = resolve_order(&snapshot, name)?;
        debug!(check = %name, order = ?order, "Resolved dependency order");

        // Everything before the final entry (the target itself) is a
        // transitive dependency and gates execution.
        for dependency in &order[..order.len() - 1] {
            let check = snapshot.get(dependency).cloned().ok_or_else(|| {
                HealthCheckError::NotRegistered {
                    name: dependency.clone(),
                }
            })?;
            let result = self.executor.execute(check).await;
            if !result.is_healthy() {
                warn!(
                    check = %name,
                    dependency = %dependency,
                    status = %result.status,
                    "Dependency gate failed"
                );
                return Err(HealthCheckError::DependencyFailed {
                    check: name.to_string(),
                    dependency: dependency.clone(),
                    reason: result.reason(),
                });
            }
        }

        let target = snapshot
            .get(name)
            .cloned()
            .ok_or_else(|| HealthCheckError::NotRegistered {
                name: name.to_string(),
            })?;
        Ok(self.executor.execute(target).await)
    }

    /// Evaluate every registered check (optionally one `check_type`)
    /// concurrently and without dependency gating.
    ///
    /// One check's panic or timeout becomes an `Error`-status entry for that
    /// name only; the result map is always complete.
    pub async fn run_all_checks(
        &self,
        type_filter: Option<&str>,
    ) -> HashMap<String, HealthCheckResult> {
        let snapshot: Vec<(String, Arc<dyn HealthCheck>)> = {
            let state = self.state.read().await;
            state
                .checks
                .iter()
                .filter(|(_, check)| type_filter.map_or(true, |t| check.check_type() == t))
                .map(|(name, check)| (name.clone(), check.clone()))
                .collect()
        };

        let run_id = format!("run_{}", &Uuid::new_v4().to_string()[..8]);
        debug!(
            run_id = %run_id,
            check_count = snapshot.len(),
            type_filter = type_filter,
            "Starting bulk health check run"
        );

        let mut handles = Vec::with_capacity(snapshot.len());
        for (name, check) in snapshot {
            let executor = self.executor.clone();
            handles.push((
                name,
                tokio::spawn(async move { executor.execute(check).await }),
            ));
        }

        let mut results = HashMap::with_capacity(handles.len());
        for (name, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => HealthCheckResult::execution_error(format!(
                    "health check task panicked: {join_error}"
                )),
            };
            results.insert(name, result);
        }

        info!(
            run_id = %run_id,
            total = results.len(),
            healthy = results.values().filter(|r| r.is_healthy()).count(),
            failed = results.values().filter(|r| r.is_failure()).count(),
            "Bulk health check run finished"
        );

        results
    }
}

/// Compute a depth-first post-order over `root` and its transitive
/// dependencies using an explicit stack with in-progress marking, so cycles
/// are caught deterministically instead of recursing unboundedly.
///
/// The returned order is deduplicated, lists every dependency before its
/// dependents, and always ends with `root`.
fn resolve_order(
    checks: &HashMap<String, Arc<dyn HealthCheck>>,
    root: &str,
) -> HealthResult<Vec<String>> {
    #[derive(PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut stack: Vec<(String, usize)> = vec![(root.to_string(), 0)];

    while let Some((node, dep_index)) = stack.pop() {
        let check = checks
            .get(&node)
            .ok_or_else(|| HealthCheckError::NotRegistered { name: node.clone() })?;
        let dependencies = check.dependencies();

        if dep_index == 0 {
            marks.insert(node.clone(), Mark::InProgress);
        }

        if dep_index < dependencies.len() {
            let dependency = dependencies[dep_index].clone();
            stack.push((node, dep_index + 1));
            match marks.get(&dependency) {
                Some(Mark::InProgress) => {
                    let mut nodes: Vec<String> = marks
                        .iter()
                        .filter(|(_, mark)| **mark == Mark::InProgress)
                        .map(|(name, _)| name.clone())
                        .collect();
                    nodes.sort();
                    return Err(HealthCheckError::CycleDetected { nodes });
                }
                Some(Mark::Done) => {}
                None => stack.push((dependency, 0)),
            }
        } else {
            marks.insert(node.clone(), Mark::Done);
            order.push(node);
        }
    }

    Ok(order)
}
