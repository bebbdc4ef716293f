//! # Metrics Sink Boundary
//!
//! The engine reports per-check timings and per-service health verdicts into
//! an injected [`MetricsSink`]. Storage and exposition format are external
//! concerns; the in-memory sink here exists for embedding and tests.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

/// Collaborator receiving check and service observations.
pub trait MetricsSink: Send + Sync {
    /// Record one check evaluation: its type, how long it took, and the
    /// error message if it failed.
    fn record_check(&self, check_type: &str, duration: Duration, error: Option<&str>);

    /// Record a service-level health verdict.
    fn record_service(&self, service_name: &str, healthy: bool);
}

/// Sink that discards everything. The default when no sink is injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record_check(&self, _check_type: &str, _duration: Duration, _error: Option<&str>) {}

    fn record_service(&self, _service_name: &str, _healthy: bool) {}
}

#[derive(Debug, Default)]
struct MetricsData {
    check_durations: HashMap<String, Vec<f64>>,
    check_errors: HashMap<String, u64>,
    service_health: HashMap<String, bool>,
}

/// Snapshot of everything an [`InMemoryMetricsSink`] has recorded.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// check_type -> observed durations in seconds.
    pub check_durations: HashMap<String, Vec<f64>>,
    /// check_type -> count of failed evaluations.
    pub check_errors: HashMap<String, u64>,
    /// service name -> last reported verdict.
    pub service_health: HashMap<String, bool>,
}

/// Sink that accumulates observations behind a single lock.
#[derive(Debug, Default)]
pub struct InMemoryMetricsSink {
    data: RwLock<MetricsData>,
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data.read();
        MetricsSnapshot {
            check_durations: data.check_durations.clone(),
            check_errors: data.check_errors.clone(),
            service_health: data.service_health.clone(),
        }
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn record_check(&self, check_type: &str, duration: Duration, error: Option<&str>) {
        let mut data = self.data.write();
        data.check_durations
            .entry(check_type.to_string())
            .or_default()
            .push(duration.as_secs_f64());
        if error.is_some() {
            *data.check_errors.entry(check_type.to_string()).or_default() += 1;
        }
    }

    fn record_service(&self, service_name: &str, healthy: bool) {
        let mut data = self.data.write();
        data.service_health.insert(service_name.to_string(), healthy);
    }
}
