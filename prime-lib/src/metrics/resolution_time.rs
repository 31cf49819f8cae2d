use super::{DurationStats, EventFilter, Metric, MetricComputationError, MetricValue};
use crate::events::{AttributeValue, Event, EventKind};
use compact_str::{CompactString, format_compact};
use std::collections::{BTreeMap, BTreeSet};

/// Latency from an item's creation to the timestamp held in one of its attributes.
///
/// Items without the end attribute are counted as open.
#[derive(Debug, Clone)]
pub struct ResolutionTime {
    name: CompactString,
    description: CompactString,
    kind: EventKind,
    end_attribute: CompactString,
    filter: EventFilter,
}

impl ResolutionTime {
    pub fn new(name: impl Into<CompactString>, kind: EventKind, end_attribute: Option<CompactString>, filter: EventFilter) -> Self {
        let end_attribute = end_attribute.unwrap_or_else(|| default_end_attribute(&kind));
        Self {
            name: name.into(),
            description: format_compact!("Days from {kind} creation to {end_attribute}"),
            kind,
            end_attribute,
            filter,
        }
    }
}

/// Issues resolve when closed, pull requests when merged.
#[must_use]
pub fn default_end_attribute(kind: &EventKind) -> CompactString {
    match kind {
        EventKind::PullRequest => "pull_request.merged_at".into(),
        other => format_compact!("{}.closed_at", other.namespace()),
    }
}

impl Metric for ResolutionTime {
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

    #[expect(clippy::cast_precision_loss, reason = "acceptable for durations")]
    fn compute(&self, events: &[&Event]) -> Result<MetricValue, MetricComputationError> {
        let mut open = 0_u64;
        let mut durations = Vec::with_capacity(events.len());

        for event in events {
            match event.attribute(&self.end_attribute) {
                None => open += 1,
                Some(AttributeValue::Timestamp(end)) => {
                    let seconds = (*end - event.timestamp()).num_seconds();
                    if seconds < 0 {
                        return Err(MetricComputationError::new(format!(
                            "{} on {} '{}' precedes its creation",
                            self.end_attribute,
                            event.kind(),
                            event.source_id()
                        )));
                    }
                    durations.push(seconds as f64);
                }
                Some(other) => {
                    return Err(MetricComputationError::new(format!(
                        "{} on {} '{}' is a {}, expected a timestamp",
                        self.end_attribute,
                        event.kind(),
                        event.source_id(),
                        other.type_name()
                    )));
                }
            }
        }

        let mut map = BTreeMap::new();
        let _ = map.insert("open".into(), MetricValue::UInt(open));
        match DurationStats::from_seconds(durations) {
            Some(stats) => stats.insert_into(&mut map),
            None => {
                let _ = map.insert("count".into(), MetricValue::UInt(0));
            }
        }

        Ok(MetricValue::Map(map))
    }
}
