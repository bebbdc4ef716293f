//! # Composite Checks
//!
//! Checks whose result is derived by aggregating other checks:
//!
//! - [`ServiceDependencyCheck`]: a flat list of sub-checks, evaluated
//!   concurrently, used when dependency order does not matter, only
//!   aggregate health does.
//! - [`ServiceDependencyGraphCheck`]: an explicit dependency graph,
//!   evaluated in topological order with cycle detection.
//!
//! Both apply the aggregation policy from [`crate::aggregator`] with their
//! own `required` flag controlling escalation.

pub mod dependency_check;
pub mod dependency_graph_check;

pub use dependency_check::ServiceDependencyCheck;
pub use dependency_graph_check::ServiceDependencyGraphCheck;
