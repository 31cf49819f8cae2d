use super::{EventFilter, Metric, MetricComputationError, MetricValue};
use crate::events::{AttributeValue, Event, EventKind};
use compact_str::CompactString;
use std::collections::{BTreeMap, BTreeSet};

const COUNTERS: [(&str, &str); 3] = [
    ("lines_added", "commit.lines_added"),
    ("lines_deleted", "commit.lines_deleted"),
    ("files_changed", "commit.files_changed"),
];

/// Lines and files touched across commits.
#[derive(Debug, Clone)]
pub struct CodeChurn {
    name: CompactString,
    filter: EventFilter,
}

impl CodeChurn {
    pub fn new(name: impl Into<CompactString>, filter: EventFilter) -> Self {
        Self { name: name.into(), filter }
    }
}

impl Metric for CodeChurn {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Lines and files changed by commits"
    }

    fn required_kinds(&self) -> BTreeSet<EventKind> {
        BTreeSet::from([EventKind::Commit])
    }

    fn accepts(&self, event: &Event) -> bool {
        *event.kind() == EventKind::Commit && self.filter.matches(event)
    }

    #[expect(clippy::cast_possible_truncation, reason = "counters are validated to be non-negative integers")]
    #[expect(clippy::cast_sign_loss, reason = "counters are validated to be non-negative integers")]
    fn compute(&self, events: &[&Event]) -> Result<MetricValue, MetricComputationError> {
        let mut totals = [0_u64; COUNTERS.len()];

        for event in events {
            for ((_, attribute), total) in COUNTERS.iter().zip(totals.iter_mut()) {
                match event.attribute(attribute) {
                    None => {}
                    Some(AttributeValue::Number(n)) if n.is_finite() && *n >= 0.0 && n.fract().abs() < f64::EPSILON => *total = total.saturating_add(*n as u64),
                    Some(other) => {
                        return Err(MetricComputationError::new(format!(
                            "{attribute} on commit '{}' must be a non-negative whole number, found {} '{other}'",
                            event.source_id(),
                            other.type_name()
                        )));
                    }
                }
            }
        }

        let mut map: BTreeMap<CompactString, MetricValue> = COUNTERS
            .iter()
            .zip(totals)
            .map(|((name, _), total)| (CompactString::from(*name), MetricValue::UInt(total)))
            .collect();

        let [added, deleted, _] = totals;
        #[expect(clippy::cast_precision_loss, reason = "acceptable for line counts")]
        let net = added as f64 - deleted as f64;
        let _ = map.insert("net_lines".into(), MetricValue::Float(net));
        let _ = map.insert("commits".into(), MetricValue::from(events.len()));

        Ok(MetricValue::Map(map))
    }
}
