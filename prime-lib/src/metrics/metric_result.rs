use super::{MetricComputationError, MetricValue};
use crate::events::{EventKey, EventKind};
use compact_str::CompactString;
use serde::Serialize;
use std::collections::BTreeSet;

/// A metric was skipped because the corpus lacks event kinds it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsufficientDataWarning {
    pub missing_kinds: BTreeSet<EventKind>,
}

/// What happened when a metric was evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricOutcome {
    Computed {
        value: MetricValue,

        /// The events the value was derived from.
        events_used: Vec<EventKey>,
    },

    Skipped(InsufficientDataWarning),

    Failed(MetricComputationError),
}

/// The result of one metric in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub name: CompactString,
    pub description: CompactString,

    #[serde(flatten)]
    pub outcome: MetricOutcome,
}

impl MetricResult {
    #[must_use]
    pub const fn value(&self) -> Option<&MetricValue> {
        match &self.outcome {
            MetricOutcome::Computed { value, .. } => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn events_used(&self) -> &[EventKey] {
        match &self.outcome {
            MetricOutcome::Computed { events_used, .. } => events_used,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn warning(&self) -> Option<&InsufficientDataWarning> {
        match &self.outcome {
            MetricOutcome::Skipped(w) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&MetricComputationError> {
        match &self.outcome {
            MetricOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_computed(&self) -> bool {
        matches!(self.outcome, MetricOutcome::Computed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_skipped() {
        let result = MetricResult {
            name: "pull_request_count".into(),
            description: "Number of pull requests".into(),
            outcome: MetricOutcome::Skipped(InsufficientDataWarning {
                missing_kinds: BTreeSet::from([EventKind::PullRequest]),
            }),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "pull_request_count",
                "description": "Number of pull requests",
                "status": "skipped",
                "missing_kinds": ["pull_request"],
            })
        );
    }

    #[test]
    fn test_accessors() {
        let result = MetricResult {
            name: "broken".into(),
            description: String::new().into(),
            outcome: MetricOutcome::Failed(MetricComputationError::new("boom")),
        };

        assert!(!result.is_computed());
        assert!(result.value().is_none());
        assert!(result.events_used().is_empty());
        assert_eq!(result.error().map(|e| e.message.as_str()), Some("boom"));
    }
}
