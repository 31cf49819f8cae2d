use super::{EventFilter, Metric, MetricComputationError, MetricValue, Table};
use crate::events::{Event, EventKind};
use compact_str::{CompactString, format_compact};
use std::collections::{BTreeMap, BTreeSet};

/// Counts events per actor, busiest actors first.
///
/// Events whose actor is unknown are left out.
#[derive(Debug, Clone)]
pub struct EventsPerActor {
    name: CompactString,
    description: CompactString,
    kind: Option<EventKind>,
    filter: EventFilter,
}

impl EventsPerActor {
    pub fn new(name: impl Into<CompactString>, kind: Option<EventKind>, filter: EventFilter) -> Self {
        let description = kind
            .as_ref()
            .map_or_else(|| "Number of events per actor".into(), |k| format_compact!("Number of {k} events per actor"));

        Self {
            name: name.into(),
            description,
            kind,
            filter,
        }
    }
}

impl Metric for EventsPerActor {
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
        Ok(MetricValue::Table(actor_table(&count_by_actor(events), false, |_| true)))
    }
}

pub(super) fn count_by_actor(events: &[&Event]) -> BTreeMap<CompactString, u64> {
    let mut counts: BTreeMap<CompactString, u64> = BTreeMap::new();
    for event in events.iter().filter(|e| e.has_known_actor()) {
        *counts.entry(event.actor().into()).or_default() += 1;
    }
    counts
}

/// Builds an `actor`/`events` table sorted by count, then by actor.
pub(super) fn actor_table(counts: &BTreeMap<CompactString, u64>, quietest_first: bool, keep: impl Fn(u64) -> bool) -> Table {
    let mut entries: Vec<(&CompactString, u64)> = counts.iter().map(|(a, c)| (a, *c)).filter(|(_, c)| keep(*c)).collect();
    entries.sort_by(|a, b| {
        let by_count = if quietest_first { a.1.cmp(&b.1) } else { b.1.cmp(&a.1) };
        by_count.then_with(|| a.0.cmp(b.0))
    });

    let mut table = Table::new(["actor", "events"]);
    for (actor, count) in entries {
        table.push_row(vec![MetricValue::String(actor.clone()), MetricValue::UInt(count)]);
    }
    table
}
