//! Shared test check implementations.

use healthcheck_core::types::{HealthCheck, HealthCheckResult, HealthStatus};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Check returning a fixed status, counting its invocations.
pub struct StaticCheck {
    name: String,
    dependencies: Vec<String>,
    status: HealthStatus,
    invocations: AtomicU32,
}

impl StaticCheck {
    pub fn healthy(name: &str) -> Arc<Self> {
        Self::with_dependencies(name, HealthStatus::Healthy, &[])
    }

    pub fn unhealthy(name: &str) -> Arc<Self> {
        Self::with_dependencies(name, HealthStatus::Unhealthy, &[])
    }

    pub fn with_dependencies(name: &str, status: HealthStatus, deps: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            status,
            invocations: AtomicU32::new(0),
        })
    }

    pub fn times_invoked(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HealthCheck for StaticCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    async fn check_health(&self) -> HealthCheckResult {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match self.status {
            HealthStatus::Healthy => HealthCheckResult::healthy(),
            HealthStatus::Warning => HealthCheckResult::warning("degraded"),
            HealthStatus::Unhealthy => HealthCheckResult::unhealthy("service is down"),
            HealthStatus::Error => HealthCheckResult::execution_error("evaluation blew up"),
        }
    }
}

/// Check whose evaluation panics.
pub struct PanickingCheck {
    name: String,
}

impl PanickingCheck {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl HealthCheck for PanickingCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check_health(&self) -> HealthCheckResult {
        panic!("intentional test panic");
    }
}

/// Check that sleeps past its own declared timeout.
pub struct HangingCheck {
    name: String,
    timeout: Duration,
}

impl HangingCheck {
    pub fn new(name: &str, timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl HealthCheck for HangingCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn check_health(&self) -> HealthCheckResult {
        tokio::time::sleep(self.timeout * 50).await;
        HealthCheckResult::healthy()
    }
}
