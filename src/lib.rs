#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Health Check Core
//!
//! Health-check dependency orchestration engine: runs a set of named, typed
//! health checks that may depend on one another, resolves execution order
//! from those dependencies, detects cycles, executes checks concurrently
//! with per-check timeouts and retries, and rolls child results up into a
//! single three-valued status.
//!
//! ## Architecture
//!
//! - **Leaf contract**: any number of concrete checks implement the
//!   [`HealthCheck`](types::HealthCheck) trait, a named, typed unit of
//!   evaluation producing a [`HealthCheckResult`](types::HealthCheckResult).
//! - **Registry**: [`HealthCheckRegistry`](registry::HealthCheckRegistry)
//!   stores checks flatly, tracks reverse-dependency edges for safe
//!   unregistration, and offers dependency-gated single-check runs next to
//!   dependency-ungated bulk runs.
//! - **Composites**: [`ServiceDependencyCheck`](composite::ServiceDependencyCheck)
//!   aggregates a flat sub-check list;
//!   [`ServiceDependencyGraphCheck`](composite::ServiceDependencyGraphCheck)
//!   topologically orders an explicit dependency graph, detecting cycles.
//! - **Aggregation**: one fixed precedence policy in [`aggregator`]:
//!   required failures dominate, optional failures degrade to warning.
//! - **Execution**: [`CheckExecutor`](executor::CheckExecutor) wraps every
//!   invocation with a hard deadline, retries, panic isolation, and a
//!   concurrency cap.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthcheck_core::registry::HealthCheckRegistry;
//! use healthcheck_core::types::{HealthCheck, HealthCheckResult};
//! use std::sync::Arc;
//!
//! struct PingCheck;
//!
//! #[async_trait::async_trait]
//! impl HealthCheck for PingCheck {
//!     fn name(&self) -> &str { "ping" }
//!     async fn check_health(&self) -> HealthCheckResult {
//!         HealthCheckResult::healthy()
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = HealthCheckRegistry::new();
//! registry.register(Arc::new(PingCheck)).await?;
//!
//! let results = registry.run_all_checks(None).await;
//! assert!(results["ping"].is_healthy());
//! # Ok(())
//! # }
//! ```
//!
//! All check-execution failures (panics, timeouts) come back as data, in the
//! form of `Error`-status results, so callers always receive a complete
//! result set or a well-typed registration/dependency/cycle error, never a
//! partial map.

pub mod aggregator;
pub mod composite;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod types;

pub use aggregator::{aggregate, AggregateEntry, AggregatedStatus};
pub use composite::{ServiceDependencyCheck, ServiceDependencyGraphCheck};
pub use config::{CheckConfig, ConfigurationManager, ConfiguredCheck, HealthConfig};
pub use error::{HealthCheckError, HealthResult};
pub use executor::{CheckExecutor, ExecutorConfig, RetryConfig};
pub use metrics::{InMemoryMetricsSink, MetricsSink, NoopMetricsSink};
pub use registry::{HealthCheckRegistry, RegistryStats};
pub use types::{HealthCheck, HealthCheckResult, HealthStatus};
