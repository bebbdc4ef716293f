//! # Check Executor
//!
//! Wraps every check invocation with the failure-injection concerns the
//! orchestration layer owns: a hard deadline (independent of whether the
//! check implementation cooperates), bounded retries with exponential
//! backoff, panic isolation, and a concurrency cap.
//!
//! All failure modes come back as data, a [`HealthCheckResult`] with
//! `Error` or `Unhealthy` status, so one misbehaving check can never abort
//! its siblings in a batch.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::constants::{
    DEFAULT_CHECK_TIMEOUT, DEFAULT_MAX_CONCURRENT_CHECKS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BACKOFF_MULTIPLIER, DEFAULT_RETRY_BASE_DELAY, DEFAULT_RETRY_MAX_DELAY,
    MAX_CHECK_TIMEOUT,
};
use crate::metrics::{MetricsSink, NoopMetricsSink};
use crate::types::{HealthCheck, HealthCheckResult};

/// Retry configuration for failing check invocations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one (1 = no retries).
    pub max_attempts: u32,
    /// Base delay between attempts.
    pub base_delay: Duration,
    /// Ceiling on the delay after backoff.
    pub max_delay: Duration,
    /// Multiplier applied to the delay between attempts.
    pub backoff_multiplier: f64,
    /// Add up to 10% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
            backoff_multiplier: DEFAULT_RETRY_BACKOFF_MULTIPLIER,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry configuration that runs every check exactly once.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Configuration for the check executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of concurrently executing check invocations.
    pub max_concurrent_checks: usize,
    /// Deadline applied when a check declares a zero timeout.
    pub default_timeout: Duration,
    /// Hard upper bound on any per-check deadline.
    pub max_timeout: Duration,
    /// Default retry behavior, overridable per call.
    pub retry: RetryConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
            default_timeout: DEFAULT_CHECK_TIMEOUT,
            max_timeout: MAX_CHECK_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// Executes individual checks with deadline, retry, and panic isolation.
#[derive(Clone)]
pub struct CheckExecutor {
    config: ExecutorConfig,
    semaphore: Arc<Semaphore>,
    metrics: Arc<dyn MetricsSink>,
}

impl Default for CheckExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckExecutor {
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_checks.max(1)));
        Self {
            config,
            semaphore,
            metrics: Arc::new(NoopMetricsSink),
        }
    }

    /// Attach a metrics sink that receives one observation per evaluation.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute one check with the executor's default retry configuration.
    pub async fn execute(&self, check: Arc<dyn HealthCheck>) -> HealthCheckResult {
        let retry = self.config.retry.clone();
        self.execute_with_retry(check, &retry).await
    }

    /// Execute one check, retrying failed attempts per `retry`.
    ///
    /// The returned result always carries `attempts` and `duration_ms`
    /// metrics; on a retried check it is the last attempt's result.
    pub async fn execute_with_retry(
        &self,
        check: Arc<dyn HealthCheck>,
        retry: &RetryConfig,
    ) -> HealthCheckResult {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return HealthCheckResult::execution_error(format!(
                    "executor is shut down: {e}"
                ));
            }
        };

        let started = Instant::now();
        let max_attempts = retry.max_attempts.max(1);
        let mut delay = retry.base_delay;
        let mut attempt = 1u32;

        let mut result = loop {
            let attempt_result = self.run_attempt(check.clone()).await;

            if !attempt_result.status.is_failure() || attempt >= max_attempts {
                break attempt_result;
            }

            warn!(
                check = check.name(),
                attempt = attempt,
                max_attempts = max_attempts,
                error = attempt_result.error.as_deref(),
                "Health check attempt failed, retrying"
            );
            tokio::time::sleep(Self::jittered(delay, retry.jitter)).await;
            delay = Duration::from_secs_f64(delay.as_secs_f64() * retry.backoff_multiplier)
                .min(retry.max_delay);
            attempt += 1;
        };

        let duration = started.elapsed();
        result
            .metrics
            .insert("attempts".to_string(), f64::from(attempt));
        result
            .metrics
            .insert("duration_ms".to_string(), duration.as_secs_f64() * 1000.0);

        self.metrics
            .record_check(check.check_type(), duration, result.error.as_deref());

        debug!(
            check = check.name(),
            status = %result.status,
            attempts = attempt,
            duration_ms = duration.as_millis() as u64,
            "Health check evaluation finished"
        );

        result
    }

    /// Run a single invocation inside a spawned task, bounded by the
    /// effective deadline. A panic or a timeout becomes an `Error`-status
    /// result for this attempt.
    async fn run_attempt(&self, check: Arc<dyn HealthCheck>) -> HealthCheckResult {
        let name = check.name().to_string();
        let deadline = self.effective_deadline(check.timeout());

        let mut handle = tokio::spawn(async move { check.check_health().await });

        match timeout(deadline, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                error!(check = %name, error = %join_error, "Health check task failed");
                HealthCheckResult::execution_error(format!(
                    "health check '{name}' panicked: {join_error}"
                ))
            }
            Err(_) => {
                handle.abort();
                error!(
                    check = %name,
                    timeout_ms = deadline.as_millis() as u64,
                    "Health check timed out"
                );
                HealthCheckResult::execution_error(format!(
                    "health check '{name}' timed out after {deadline:?}"
                ))
            }
        }
    }

    fn effective_deadline(&self, declared: Duration) -> Duration {
        if declared.is_zero() {
            self.config.default_timeout.min(self.config.max_timeout)
        } else {
            declared.min(self.config.max_timeout)
        }
    }

    fn jittered(delay: Duration, jitter: bool) -> Duration {
        if !jitter || delay.is_zero() {
            return delay;
        }
        let max_jitter_ms = (delay.as_millis() as u64 / 10).max(1);
        delay + Duration::from_millis(fastrand::u64(0..=max_jitter_ms))
    }
}
