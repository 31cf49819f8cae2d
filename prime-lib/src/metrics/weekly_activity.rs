use super::{EventFilter, Metric, MetricComputationError, MetricValue, Table};
use crate::events::{Event, EventKind};
use chrono::Datelike;
use compact_str::{CompactString, format_compact};
use std::collections::{BTreeMap, BTreeSet};

/// Events per ISO week, one column per event kind.
///
/// Only weeks with at least one event appear.
#[derive(Debug, Clone)]
pub struct WeeklyActivity {
    name: CompactString,
    filter: EventFilter,
}

impl WeeklyActivity {
    pub fn new(name: impl Into<CompactString>, filter: EventFilter) -> Self {
        Self { name: name.into(), filter }
    }
}

impl Metric for WeeklyActivity {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Number of events per ISO week and kind"
    }

    fn required_kinds(&self) -> BTreeSet<EventKind> {
        BTreeSet::new()
    }

    fn accepts(&self, event: &Event) -> bool {
        self.filter.matches(event)
    }

    fn compute(&self, events: &[&Event]) -> Result<MetricValue, MetricComputationError> {
        let kinds: BTreeSet<&EventKind> = events.iter().map(|e| e.kind()).collect();

        let mut weeks: BTreeMap<(i32, u32), BTreeMap<&EventKind, u64>> = BTreeMap::new();
        for event in events {
            let week = event.timestamp().iso_week();
            *weeks.entry((week.year(), week.week())).or_default().entry(event.kind()).or_default() += 1;
        }

        let mut table = Table::new(core::iter::once(CompactString::from("week")).chain(kinds.iter().map(|k| CompactString::from(k.namespace()))));
        for ((year, week), counts) in weeks {
            let mut row = vec![MetricValue::String(format_compact!("{year}-W{week:02}"))];
            row.extend(kinds.iter().map(|k| MetricValue::UInt(counts.get(k).copied().unwrap_or_default())));
            table.push_row(row);
        }

        Ok(MetricValue::Table(table))
    }
}
