use super::MetricValue;
use crate::events::{Event, EventKind};
use compact_str::CompactString;
use core::fmt::{Debug, Display, Formatter};
use serde::Serialize;
use std::collections::BTreeSet;

/// A metric failed while computing its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricComputationError {
    pub message: CompactString,
}

impl MetricComputationError {
    pub fn new(message: impl Into<CompactString>) -> Self {
        Self { message: message.into() }
    }
}

impl Display for MetricComputationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for MetricComputationError {}

/// A named computation over events.
///
/// Implementations must be deterministic: the same events in the same order always
/// produce the same value. They must not consult the wall clock.
pub trait Metric: Send + Sync + Debug {
    /// Unique name of the metric within a run.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Event kinds that must be present in the corpus for the metric to run.
    ///
    /// An empty set means the metric runs on any corpus.
    fn required_kinds(&self) -> BTreeSet<EventKind>;

    /// Whether the metric consumes a given event.
    fn accepts(&self, event: &Event) -> bool;

    /// Computes the metric over the accepted events, in corpus order.
    fn compute(&self, events: &[&Event]) -> Result<MetricValue, MetricComputationError>;
}
