//! # Check Configuration
//!
//! YAML-driven configuration for the orchestration engine. Persistence of
//! this structure is an external concern; the engine only *reads* it;
//! timeouts, retries, and dependency names parameterize a check before
//! registration via [`ConfiguredCheck`].
//!
//! ## Configuration structure
//!
//! ```yaml
//! # healthcheck-config.yaml
//! executor:
//!   max_concurrent_checks: 16
//!   default_timeout_ms: 5000
//!
//! checks:
//!   database:
//!     enabled: true
//!     timeout_ms: 2000
//!     retries: 3
//!     retry_delay_ms: 250
//!   api:
//!     dependencies: ["database"]
//!
//! environments:
//!   production:
//!     checks:
//!       database:
//!         timeout_ms: 10000
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_CHECK_TIMEOUT, DEFAULT_MAX_CONCURRENT_CHECKS, DEFAULT_RETRY_ATTEMPTS,
    MAX_CHECK_TIMEOUT,
};
use crate::error::{HealthCheckError, HealthResult};
use crate::executor::{ExecutorConfig, RetryConfig};
use crate::types::{HealthCheck, HealthCheckResult};

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_CHECK_TIMEOUT.as_millis() as u64
}

fn default_retries() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    250
}

/// Per-check configuration consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Evaluation interval for an external scheduler; unused by the engine.
    #[serde(default)]
    pub interval_ms: Option<u64>,
    /// Total attempts including the first (1 = no retries).
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Free-form parameters handed to the concrete check implementation.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_timeout_ms(),
            interval_ms: None,
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            dependencies: Vec::new(),
            parameters: HashMap::new(),
        }
    }
}

impl CheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Retry behavior derived from this check's configuration.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retries.max(1),
            base_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryConfig::default()
        }
    }
}

/// Executor settings as they appear in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    pub max_concurrent_checks: usize,
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
            default_timeout_ms: DEFAULT_CHECK_TIMEOUT.as_millis() as u64,
            max_timeout_ms: MAX_CHECK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ExecutorSettings {
    pub fn to_executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_concurrent_checks: self.max_concurrent_checks,
            default_timeout: Duration::from_millis(self.default_timeout_ms),
            max_timeout: Duration::from_millis(self.max_timeout_ms),
            retry: RetryConfig::default(),
        }
    }
}

/// Environment-specific overlay: replaces matching check entries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnvironmentOverlay {
    #[serde(default)]
    pub checks: HashMap<String, CheckConfig>,
}

/// Top-level health configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthConfig {
    #[serde(default)]
    pub executor: ExecutorSettings,
    #[serde(default)]
    pub checks: HashMap<String, CheckConfig>,
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverlay>,
}

/// Loads, interpolates, and validates health configuration.
///
/// The active environment comes from `HEALTHCHECK_ENV` (default
/// `development`); an `environments.<name>` overlay replaces matching
/// check entries after the base config is parsed.
#[derive(Debug)]
pub struct ConfigurationManager {
    config: Arc<HealthConfig>,
    environment: String,
}

impl ConfigurationManager {
    fn environment_from_env() -> String {
        std::env::var("HEALTHCHECK_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// Load configuration from a YAML file.
    pub async fn load_from_file<P: AsRef<Path> + std::fmt::Debug>(path: P) -> HealthResult<Self> {
        let path = path.as_ref();
        info!("Loading health configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            HealthCheckError::ConfigurationError {
                source_name: format!("{path:?}"),
                reason: format!("Failed to read configuration file: {e}"),
            }
        })?;

        Self::load_from_yaml(&content)
    }

    /// Load configuration from a YAML string.
    pub fn load_from_yaml(yaml_content: &str) -> HealthResult<Self> {
        let environment = Self::environment_from_env();
        let interpolated = Self::interpolate_env_vars(yaml_content);
        let mut config: HealthConfig =
            serde_yaml::from_str(&interpolated).map_err(|e| {
                HealthCheckError::ConfigurationError {
                    source_name: "yaml".to_string(),
                    reason: format!("Failed to parse health configuration YAML: {e}"),
                }
            })?;

        if let Some(overlay) = config.environments.get(&environment).cloned() {
            for (name, check_config) in overlay.checks {
                config.checks.insert(name, check_config);
            }
        }

        Self::validate(&config)?;
        debug!(
            environment = %environment,
            checks = config.checks.len(),
            "Health configuration loaded"
        );

        Ok(Self {
            config: Arc::new(config),
            environment,
        })
    }

    pub fn config(&self) -> Arc<HealthConfig> {
        Arc::clone(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn check_config(&self, name: &str) -> Option<&CheckConfig> {
        self.config.checks.get(name)
    }

    /// Interpolate `${VAR}` references from the process environment.
    /// Unresolved references are left intact.
    fn interpolate_env_vars(template: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
        re.replace_all(template, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{var_name}}}"))
        })
        .to_string()
    }

    /// Validate structural constraints: non-empty names, positive timeouts,
    /// and dependencies that reference defined checks.
    fn validate(config: &HealthConfig) -> HealthResult<()> {
        for (name, check) in &config.checks {
            if name.is_empty() {
                return Err(HealthCheckError::ConfigurationError {
                    source_name: "health_config".to_string(),
                    reason: "Check name cannot be empty".to_string(),
                });
            }
            if check.timeout_ms == 0 {
                return Err(HealthCheckError::ConfigurationError {
                    source_name: "health_config".to_string(),
                    reason: format!("Check '{name}' has a zero timeout"),
                });
            }
            for dependency in &check.dependencies {
                if !config.checks.contains_key(dependency) {
                    return Err(HealthCheckError::ConfigurationError {
                        source_name: "health_config".to_string(),
                        reason: format!(
                            "Check '{name}' depends on undefined check '{dependency}'"
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Wraps any check with timeout and dependency names taken from a
/// [`CheckConfig`], leaving the inner evaluation logic untouched. This is
/// how externally-managed configuration parameterizes a check before it is
/// registered.
pub struct ConfiguredCheck {
    inner: Arc<dyn HealthCheck>,
    timeout: Duration,
    dependencies: Vec<String>,
}

impl ConfiguredCheck {
    pub fn new(inner: Arc<dyn HealthCheck>, config: &CheckConfig) -> Self {
        Self {
            inner,
            timeout: config.timeout(),
            dependencies: config.dependencies.clone(),
        }
    }
}

#[async_trait::async_trait]
impl HealthCheck for ConfiguredCheck {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check_type(&self) -> &str {
        self.inner.check_type()
    }

    fn required(&self) -> bool {
        self.inner.required()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    async fn check_health(&self) -> HealthCheckResult {
        self.inner.check_health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopCheck;

    #[async_trait::async_trait]
    impl HealthCheck for NoopCheck {
        fn name(&self) -> &str {
            "noop"
        }

        async fn check_health(&self) -> HealthCheckResult {
            HealthCheckResult::healthy()
        }
    }

    #[test]
    fn check_config_defaults_apply() {
        let config: CheckConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.enabled);
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.retries, 1);
        assert!(config.dependencies.is_empty());
        assert!(config.interval_ms.is_none());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
executor:
  max_concurrent_checks: 4
  default_timeout_ms: 1000
  max_timeout_ms: 30000

checks:
  database:
    timeout_ms: 2000
    retries: 3
    retry_delay_ms: 100
    parameters:
      dsn: "postgres://localhost/app"
  api:
    dependencies: ["database"]
"#;
        let manager = ConfigurationManager::load_from_yaml(yaml).unwrap();
        let config = manager.config();
        assert_eq!(config.executor.max_concurrent_checks, 4);
        assert_eq!(config.checks["database"].retries, 3);
        assert_eq!(
            config.checks["api"].dependencies,
            vec!["database".to_string()]
        );
        assert_eq!(
            config.checks["database"].parameters["dsn"],
            serde_json::json!("postgres://localhost/app")
        );
    }

    #[test]
    fn undefined_dependency_fails_validation() {
        let yaml = r#"
checks:
  api:
    dependencies: ["ghost"]
"#;
        let err = ConfigurationManager::load_from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let yaml = r#"
checks:
  api:
    timeout_ms: 0
"#;
        assert!(ConfigurationManager::load_from_yaml(yaml).is_err());
    }

    #[test]
    fn env_vars_are_interpolated() {
        std::env::set_var("HC_TEST_DSN", "postgres://interpolated");
        let yaml = r#"
checks:
  database:
    parameters:
      dsn: "${HC_TEST_DSN}"
"#;
        let manager = ConfigurationManager::load_from_yaml(yaml).unwrap();
        assert_eq!(
            manager.check_config("database").unwrap().parameters["dsn"],
            serde_json::json!("postgres://interpolated")
        );
        std::env::remove_var("HC_TEST_DSN");
    }

    #[test]
    fn retry_config_derives_from_check_config() {
        let config = CheckConfig {
            retries: 0,
            retry_delay_ms: 42,
            ..CheckConfig::default()
        };
        let retry = config.retry_config();
        // Zero retries still means one attempt.
        assert_eq!(retry.max_attempts, 1);
        assert_eq!(retry.base_delay, Duration::from_millis(42));
    }

    #[tokio::test]
    async fn configured_check_overrides_timeout_and_dependencies() {
        let config = CheckConfig {
            timeout_ms: 1234,
            dependencies: vec!["database".to_string()],
            ..CheckConfig::default()
        };
        let check = ConfiguredCheck::new(Arc::new(NoopCheck), &config);

        assert_eq!(check.name(), "noop");
        assert_eq!(check.timeout(), Duration::from_millis(1234));
        assert_eq!(check.dependencies(), vec!["database".to_string()]);
        assert!(check.check_health().await.is_healthy());
    }

    #[tokio::test]
    async fn load_from_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("healthcheck-config.yaml");
        tokio::fs::write(
            &path,
            "checks:\n  database:\n    timeout_ms: 2500\n",
        )
        .await
        .unwrap();

        let manager = ConfigurationManager::load_from_file(&path).await.unwrap();
        assert_eq!(manager.check_config("database").unwrap().timeout_ms, 2500);
    }
}
