//! # System Constants
//!
//! Default limits and well-known check-type names shared across the
//! orchestration engine. Values here are the fallbacks used when a check or
//! an executor configuration does not override them.

use std::time::Duration;

/// Default per-check evaluation deadline.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Hard upper bound applied to any per-check deadline.
pub const MAX_CHECK_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of checks evaluated concurrently by the executor.
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 16;

/// Default retry attempts for a failing check (1 = no retries).
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;

/// Default base delay between retry attempts.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Default ceiling on the retry delay after backoff.
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

/// Default multiplier applied to the retry delay between attempts.
pub const DEFAULT_RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Well-known check-type category names.
///
/// `check_type` is a free-form string; these constants only cover the
/// categories the engine itself emits or filters on.
pub mod check_types {
    /// Catch-all for checks that declare no explicit category.
    pub const GENERIC: &str = "generic";
    /// Composite over a flat list of sub-checks.
    pub const SERVICE_DEPENDENCY: &str = "service_dependency";
    /// Composite over an explicit dependency graph.
    pub const SERVICE_DEPENDENCY_GRAPH: &str = "service_dependency_graph";
}
