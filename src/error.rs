//! Error types for the health-check orchestration engine.
//!
//! Only registration-time and dependency-resolution-time failures surface as
//! typed errors. Anything that goes wrong while a check is *evaluating*
//! (panic, timeout, a failed invocation) is captured as data, a
//! [`HealthCheckResult`](crate::types::HealthCheckResult) with `Error`
//! status, so a batch operation always returns a complete result set.

use thiserror::Error;

/// Errors raised by the registry, composites, and configuration loading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HealthCheckError {
    /// A check with this name is already present in the registry.
    #[error("Health check '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// No check with this name is present in the registry.
    #[error("Health check '{name}' is not registered")]
    NotRegistered { name: String },

    /// The check cannot be unregistered while other checks depend on it.
    #[error("Health check '{name}' has dependent checks: {dependents:?}")]
    HasDependents {
        name: String,
        dependents: Vec<String>,
    },

    /// Transitive dependency resolution found a non-healthy dependency, so
    /// the target check was never invoked.
    #[error("Dependency '{dependency}' of check '{check}' is not healthy: {reason}")]
    DependencyFailed {
        check: String,
        dependency: String,
        reason: String,
    },

    /// The dependency graph is not a DAG. Display output always contains
    /// the substring "cycle detected".
    #[error("cycle detected in health check dependencies involving: {nodes:?}")]
    CycleDetected { nodes: Vec<String> },

    /// Configuration could not be read, parsed, or validated.
    #[error("Configuration error in {source_name}: {reason}")]
    ConfigurationError { source_name: String, reason: String },
}

pub type HealthResult<T> = anyhow::Result<T, HealthCheckError>;

impl From<serde_yaml::Error> for HealthCheckError {
    fn from(error: serde_yaml::Error) -> Self {
        HealthCheckError::ConfigurationError {
            source_name: "yaml".to_string(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_message_contains_marker() {
        let err = HealthCheckError::CycleDetected {
            nodes: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.to_string().contains("cycle detected"));
    }

    #[test]
    fn dependency_failed_names_both_sides() {
        let err = HealthCheckError::DependencyFailed {
            check: "api".to_string(),
            dependency: "database".to_string(),
            reason: "connection refused".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("api"));
        assert!(message.contains("database"));
        assert!(message.contains("connection refused"));
    }
}
