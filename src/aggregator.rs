//! # Status Aggregation
//!
//! The single roll-up policy applied wherever composite checks combine
//! child results into one parent status:
//!
//! - any failed entry with `required == true` dominates unconditionally and
//!   yields `Unhealthy`;
//! - otherwise failed-but-optional and warned entries degrade the aggregate
//!   to `Warning` (never to `Unhealthy`);
//! - otherwise the aggregate is `Healthy`.
//!
//! All child warnings propagate into the aggregate's warning list regardless
//! of branch. [`aggregate`] is a pure function with no hidden state.

use crate::types::{HealthCheckResult, HealthStatus};

/// One child entry feeding the aggregation policy.
#[derive(Debug, Clone)]
pub struct AggregateEntry {
    pub name: String,
    pub status: HealthStatus,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub required: bool,
}

impl AggregateEntry {
    pub fn new(name: impl Into<String>, status: HealthStatus, required: bool) -> Self {
        Self {
            name: name.into(),
            status,
            error: None,
            warnings: Vec::new(),
            required,
        }
    }

    /// Build an entry from a child's full result.
    pub fn from_result(name: impl Into<String>, result: &HealthCheckResult, required: bool) -> Self {
        Self {
            name: name.into(),
            status: result.status,
            error: result.error.clone(),
            warnings: result.warnings.clone(),
            required,
        }
    }

    fn reason(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| format!("status is {}", self.status))
    }
}

/// Aggregated verdict over a set of child entries.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedStatus {
    pub status: HealthStatus,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

/// Combine child results into one parent status under the fixed precedence
/// policy. Entry order is preserved in the propagated warnings.
pub fn aggregate(entries: &[AggregateEntry]) -> AggregatedStatus {
    let mut warnings: Vec<String> = entries
        .iter()
        .flat_map(|entry| entry.warnings.iter().cloned())
        .collect();

    let failed_required: Vec<&AggregateEntry> = entries
        .iter()
        .filter(|entry| entry.status.is_failure() && entry.required)
        .collect();

    if !failed_required.is_empty() {
        let summary = failed_required
            .iter()
            .map(|entry| format!("{} ({})", entry.name, entry.reason()))
            .collect::<Vec<_>>()
            .join(", ");
        return AggregatedStatus {
            status: HealthStatus::Unhealthy,
            error: Some(format!("Required dependencies failed: {summary}")),
            warnings,
        };
    }

    let failed_optional: Vec<&AggregateEntry> = entries
        .iter()
        .filter(|entry| entry.status.is_failure())
        .collect();
    let any_warned = entries
        .iter()
        .any(|entry| entry.status == HealthStatus::Warning);

    if !failed_optional.is_empty() || any_warned {
        for entry in &failed_optional {
            warnings.push(format!(
                "Optional dependency '{}' failed: {}",
                entry.name,
                entry.reason()
            ));
        }
        return AggregatedStatus {
            status: HealthStatus::Warning,
            error: None,
            warnings,
        };
    }

    AggregatedStatus {
        status: HealthStatus::Healthy,
        error: None,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(name: &str, status: HealthStatus, required: bool) -> AggregateEntry {
        AggregateEntry::new(name, status, required)
    }

    #[test]
    fn all_healthy_aggregates_healthy() {
        let entries = vec![
            entry("a", HealthStatus::Healthy, true),
            entry("b", HealthStatus::Healthy, false),
        ];
        let rolled = aggregate(&entries);
        assert_eq!(rolled.status, HealthStatus::Healthy);
        assert!(rolled.error.is_none());
        assert!(rolled.warnings.is_empty());
    }

    #[test]
    fn required_failure_dominates() {
        let entries = vec![
            entry("a", HealthStatus::Healthy, true),
            entry("db", HealthStatus::Unhealthy, true),
            entry("cache", HealthStatus::Error, false),
        ];
        let rolled = aggregate(&entries);
        assert_eq!(rolled.status, HealthStatus::Unhealthy);
        let error = rolled.error.unwrap();
        assert!(error.contains("db"));
    }

    #[test]
    fn optional_failure_degrades_to_warning() {
        let entries = vec![
            entry("a", HealthStatus::Healthy, true),
            entry("cache", HealthStatus::Unhealthy, false),
        ];
        let rolled = aggregate(&entries);
        assert_eq!(rolled.status, HealthStatus::Warning);
        assert!(rolled.error.is_none());
        assert!(rolled.warnings.iter().any(|w| w.contains("cache")));
    }

    #[test]
    fn warned_entry_degrades_to_warning() {
        let mut warned = entry("queue", HealthStatus::Warning, true);
        warned.warnings.push("queue depth above threshold".to_string());
        let entries = vec![entry("a", HealthStatus::Healthy, true), warned];
        let rolled = aggregate(&entries);
        assert_eq!(rolled.status, HealthStatus::Warning);
        assert!(rolled
            .warnings
            .contains(&"queue depth above threshold".to_string()));
    }

    #[test]
    fn child_warnings_propagate_in_every_branch() {
        let mut healthy_with_warning = entry("a", HealthStatus::Healthy, true);
        healthy_with_warning.warnings.push("slow handshake".to_string());
        let failed = entry("db", HealthStatus::Unhealthy, true);
        let rolled = aggregate(&[healthy_with_warning, failed]);
        assert_eq!(rolled.status, HealthStatus::Unhealthy);
        assert!(rolled.warnings.contains(&"slow handshake".to_string()));
    }

    #[test]
    fn empty_input_is_healthy() {
        let rolled = aggregate(&[]);
        assert_eq!(rolled.status, HealthStatus::Healthy);
    }

    fn arb_status() -> impl Strategy<Value = HealthStatus> {
        prop_oneof![
            Just(HealthStatus::Healthy),
            Just(HealthStatus::Warning),
            Just(HealthStatus::Unhealthy),
            Just(HealthStatus::Error),
        ]
    }

    fn arb_entries() -> impl Strategy<Value = Vec<AggregateEntry>> {
        prop::collection::vec(
            ("[a-z]{1,8}", arb_status(), any::<bool>()).prop_map(|(name, status, required)| {
                AggregateEntry::new(name, status, required)
            }),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn aggregation_is_idempotent(entries in arb_entries()) {
            prop_assert_eq!(aggregate(&entries), aggregate(&entries));
        }

        #[test]
        fn precedence_law_holds(entries in arb_entries()) {
            let rolled = aggregate(&entries);
            let any_required_failed = entries
                .iter()
                .any(|e| e.status.is_failure() && e.required);
            if any_required_failed {
                prop_assert_eq!(rolled.status, HealthStatus::Unhealthy);
            } else {
                // With no required failures the aggregate is at worst Warning.
                prop_assert_ne!(rolled.status, HealthStatus::Unhealthy);
                prop_assert_ne!(rolled.status, HealthStatus::Error);
            }
        }
    }
}
