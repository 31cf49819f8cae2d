//! Metric definitions and their reference implementations
//!
//! A metric is a pure function from a slice of events to a [`MetricValue`]. Each
//! metric declares the event kinds it needs through [`Metric::required_kinds`]; the
//! engine skips a metric whose needs aren't met by the corpus, recording an
//! [`InsufficientDataWarning`] instead of running it on partial data.
//!
//! # Implementation Model
//!
//! Metrics never see the whole corpus. The engine hands [`Metric::compute`] only the
//! events for which [`Metric::accepts`] returned `true`, in corpus order, and records
//! the keys of those events next to the computed value so every result can be traced
//! back to the activity it was derived from.
//!
//! Metrics are configured through [`MetricSpec`], a tagged enum with one variant per
//! reference implementation. Every variant accepts an optional name override and an
//! [`EventFilter`].

mod code_churn;
mod duration_stats;
mod event_count;
mod event_filter;
mod events_per_actor;
mod issue_to_merge_time;
mod low_activity_actors;
mod metric;
mod metric_result;
mod metric_spec;
mod metric_value;
mod resolution_time;
mod weekly_activity;

pub use code_churn::CodeChurn;
pub use duration_stats::DurationStats;
pub use event_count::EventCount;
pub use event_filter::{EventFilter, FilterValue};
pub use events_per_actor::EventsPerActor;
pub use issue_to_merge_time::IssueToMergeTime;
pub use low_activity_actors::LowActivityActors;
pub use metric::{Metric, MetricComputationError};
pub use metric_result::{InsufficientDataWarning, MetricOutcome, MetricResult};
pub use metric_spec::{MetricSpec, default_metric_specs};
pub use metric_value::{MetricValue, Table};
pub use resolution_time::ResolutionTime;
pub use weekly_activity::WeeklyActivity;
