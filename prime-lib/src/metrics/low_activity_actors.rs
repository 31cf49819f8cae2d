use super::events_per_actor::{actor_table, count_by_actor};
use super::{EventFilter, Metric, MetricComputationError, MetricValue};
use crate::events::{Event, EventKind};
use compact_str::{CompactString, format_compact};
use std::collections::BTreeSet;

/// Actors with at least one event but fewer than a threshold.
#[derive(Debug, Clone)]
pub struct LowActivityActors {
    name: CompactString,
    description: CompactString,
    kind: Option<EventKind>,
    threshold: u64,
    filter: EventFilter,
}

impl LowActivityActors {
    pub fn new(name: impl Into<CompactString>, kind: Option<EventKind>, threshold: u64, filter: EventFilter) -> Self {
        let description = match &kind {
            Some(k) => format_compact!("Actors with fewer than {threshold} {k} events"),
            None => format_compact!("Actors with fewer than {threshold} events"),
        };

        Self {
            name: name.into(),
            description,
            kind,
            threshold,
            filter,
        }
    }
}

impl Metric for LowActivityActors {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn required_kinds(&self) -> BTreeSet<EventKind> {
        self.kind.iter().cloned().collect()
    }

    fn accepts(&self, event: &Event) -> bool {
        self.kind.as_ref().is_none_or(|k| k == event.kind()) && event.has_known_actor() && self.filter.matches(event)
    }

    fn compute(&self, events: &[&Event]) -> Result<MetricValue, MetricComputationError> {
        let counts = count_by_actor(events);
        Ok(MetricValue::Table(actor_table(&counts, true, |c| c < self.threshold)))
    }
}
