use super::resolution_time::default_end_attribute;
use super::{CodeChurn, EventCount, EventFilter, EventsPerActor, IssueToMergeTime, LowActivityActors, Metric, ResolutionTime, WeeklyActivity};
use crate::events::EventKind;
use compact_str::{CompactString, format_compact};
use serde::Deserialize;
use std::sync::Arc;

/// Configuration of one metric.
///
/// Every variant takes an optional `name`, defaulting to a name derived from the
/// variant's parameters, and an optional `filter`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum MetricSpec {
    EventCount {
        name: Option<CompactString>,
        kind: EventKind,
        #[serde(default)]
        filter: EventFilter,
    },

    EventsPerActor {
        name: Option<CompactString>,
        kind: Option<EventKind>,
        #[serde(default)]
        filter: EventFilter,
    },

    ResolutionTime {
        name: Option<CompactString>,
        kind: EventKind,
        end_attribute: Option<CompactString>,
        #[serde(default)]
        filter: EventFilter,
    },

    CodeChurn {
        name: Option<CompactString>,
        #[serde(default)]
        filter: EventFilter,
    },

    WeeklyActivity {
        name: Option<CompactString>,
        #[serde(default)]
        filter: EventFilter,
    },

    IssueToMergeTime {
        name: Option<CompactString>,
        #[serde(default)]
        filter: EventFilter,
    },

    LowActivityActors {
        name: Option<CompactString>,
        kind: Option<EventKind>,
        threshold: u64,
        #[serde(default)]
        filter: EventFilter,
    },
}

impl MetricSpec {
    #[must_use]
    pub fn name(&self) -> CompactString {
        match self {
            Self::EventCount { name, kind, .. } => name.clone().unwrap_or_else(|| format_compact!("{kind}_count")),
            Self::EventsPerActor { name, kind, .. } => name.clone().unwrap_or_else(|| match kind {
                Some(k) => format_compact!("{k}s_per_actor"),
                None => "events_per_actor".into(),
            }),
            Self::ResolutionTime { name, kind, end_attribute, .. } => name.clone().unwrap_or_else(|| {
                let end = end_attribute.clone().unwrap_or_else(|| default_end_attribute(kind));
                if end.ends_with(".merged_at") {
                    format_compact!("{kind}_merge_time")
                } else {
                    format_compact!("{kind}_resolution_time")
                }
            }),
            Self::CodeChurn { name, .. } => name.clone().unwrap_or_else(|| "code_churn".into()),
            Self::WeeklyActivity { name, .. } => name.clone().unwrap_or_else(|| "weekly_activity".into()),
            Self::IssueToMergeTime { name, .. } => name.clone().unwrap_or_else(|| "issue_to_merge_time".into()),
            Self::LowActivityActors { name, .. } => name.clone().unwrap_or_else(|| "low_activity_actors".into()),
        }
    }

    /// Instantiates the metric described by this spec.
    #[must_use]
    pub fn build(&self) -> Arc<dyn Metric> {
        let name = self.name();
        match self {
            Self::EventCount { kind, filter, .. } => Arc::new(EventCount::new(name, kind.clone(), filter.clone())),
            Self::EventsPerActor { kind, filter, .. } => Arc::new(EventsPerActor::new(name, kind.clone(), filter.clone())),
            Self::ResolutionTime {
                kind, end_attribute, filter, ..
            } => Arc::new(ResolutionTime::new(name, kind.clone(), end_attribute.clone(), filter.clone())),
            Self::CodeChurn { filter, .. } => Arc::new(CodeChurn::new(name, filter.clone())),
            Self::WeeklyActivity { filter, .. } => Arc::new(WeeklyActivity::new(name, filter.clone())),
            Self::IssueToMergeTime { filter, .. } => Arc::new(IssueToMergeTime::new(name, filter.clone())),
            Self::LowActivityActors { kind, threshold, filter, .. } => {
                Arc::new(LowActivityActors::new(name, kind.clone(), *threshold, filter.clone()))
            }
        }
    }
}

/// The metrics computed when a configuration doesn't list any.
#[must_use]
pub fn default_metric_specs() -> Vec<MetricSpec> {
    let count = |kind| MetricSpec::EventCount {
        name: None,
        kind,
        filter: EventFilter::default(),
    };
    let resolution = |kind| MetricSpec::ResolutionTime {
        name: None,
        kind,
        end_attribute: None,
        filter: EventFilter::default(),
    };

    vec![
        count(EventKind::Commit),
        count(EventKind::Issue),
        count(EventKind::PullRequest),
        MetricSpec::EventsPerActor {
            name: None,
            kind: None,
            filter: EventFilter::default(),
        },
        resolution(EventKind::Issue),
        resolution(EventKind::PullRequest),
        MetricSpec::CodeChurn {
            name: None,
            filter: EventFilter::default(),
        },
        MetricSpec::WeeklyActivity {
            name: None,
            filter: EventFilter::default(),
        },
        MetricSpec::IssueToMergeTime {
            name: None,
            filter: EventFilter::default(),
        },
        MetricSpec::LowActivityActors {
            name: None,
            kind: None,
            threshold: 10,
            filter: EventFilter::default(),
        },
    ]
}
