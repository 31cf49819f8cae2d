use super::{EventFilter, Metric, MetricComputationError, MetricValue};
use crate::events::{Event, EventKind};
use compact_str::{CompactString, format_compact};
use std::collections::BTreeSet;

/// Number of events of one kind.
#[derive(Debug, Clone)]
pub struct EventCount {
    name: CompactString,
    description: CompactString,
    kind: EventKind,
    filter: EventFilter,
}

impl EventCount {
    pub fn new(name: impl Into<CompactString>, kind: EventKind, filter: EventFilter) -> Self {
        Self {
            name: name.into(),
            description: format_compact!("Number of {kind} events"),
            kind,
            filter,
        }
    }
}

impl Metric for EventCount {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn required_kinds(&self) -> BTreeSet<EventKind> {
        BTreeSet::from([self.kind.clone()])
    }

    fn accepts(&self, event: &Event) -> bool {
        *event.kind() == self.kind && self.filter.matches(event)
    }

    fn compute(&self, events: &[&Event]) -> Result<MetricValue, MetricComputationError> {
        Ok(MetricValue::from(events.len()))
    }
}
