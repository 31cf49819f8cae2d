use super::{DurationStats, EventFilter, Metric, MetricComputationError, MetricValue};
use crate::events::{AttributeValue, Event, EventKind};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use std::collections::{BTreeMap, BTreeSet};

const CLOSES_ISSUE: &str = "pull_request.closes_issue";
const MERGED_AT: &str = "pull_request.merged_at";

/// Days from an issue being opened to the merge of the pull request that closes it.
///
/// Pull requests are linked to issues through their `pull_request.closes_issue`
/// attribute, matched against issue source ids. When several issue sources report the
/// same number, the earliest issue wins.
#[derive(Debug, Clone)]
pub struct IssueToMergeTime {
    name: CompactString,
    filter: EventFilter,
}

impl IssueToMergeTime {
    pub fn new(name: impl Into<CompactString>, filter: EventFilter) -> Self {
        Self { name: name.into(), filter }
    }
}

impl Metric for IssueToMergeTime {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Days from an issue being opened to the merge of the pull request closing it"
    }

    fn required_kinds(&self) -> BTreeSet<EventKind> {
        BTreeSet::from([EventKind::Issue, EventKind::PullRequest])
    }

    fn accepts(&self, event: &Event) -> bool {
        matches!(event.kind(), EventKind::Issue | EventKind::PullRequest) && self.filter.matches(event)
    }

    #[expect(clippy::cast_precision_loss, reason = "acceptable for durations")]
    fn compute(&self, events: &[&Event]) -> Result<MetricValue, MetricComputationError> {
        let mut opened: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();
        for issue in events.iter().filter(|e| *e.kind() == EventKind::Issue) {
            let _ = opened.entry(issue.source_id()).or_insert(issue.timestamp());
        }

        let mut linked = 0_u64;
        let mut unlinked = 0_u64;
        let mut durations = Vec::new();

        for pr in events.iter().filter(|e| *e.kind() == EventKind::PullRequest) {
            let merged_at = match pr.attribute(MERGED_AT) {
                None => continue,
                Some(AttributeValue::Timestamp(t)) => *t,
                Some(other) => return Err(type_error(pr, MERGED_AT, "timestamp", other)),
            };

            let issue_id = match pr.attribute(CLOSES_ISSUE) {
                None => {
                    unlinked += 1;
                    continue;
                }
                Some(AttributeValue::Number(n)) => n.to_string(),
                Some(AttributeValue::String(s)) => s.trim_start_matches('#').to_string(),
                Some(other) => return Err(type_error(pr, CLOSES_ISSUE, "number", other)),
            };

            let Some(opened_at) = opened.get(issue_id.as_str()) else {
                unlinked += 1;
                continue;
            };

            let seconds = (merged_at - *opened_at).num_seconds();
            if seconds < 0 {
                return Err(MetricComputationError::new(format!(
                    "pull request '{}' was merged before issue '{issue_id}' was opened",
                    pr.source_id()
                )));
            }

            linked += 1;
            durations.push(seconds as f64);
        }

        let mut map = BTreeMap::new();
        match DurationStats::from_seconds(durations) {
            Some(stats) => stats.insert_into(&mut map),
            None => {
                let _ = map.insert("count".into(), MetricValue::UInt(0));
            }
        }
        let _ = map.insert("linked".into(), MetricValue::UInt(linked));
        let _ = map.insert("unlinked_merges".into(), MetricValue::UInt(unlinked));

        Ok(MetricValue::Map(map))
    }
}

fn type_error(event: &Event, attribute: &str, expected: &str, found: &AttributeValue) -> MetricComputationError {
    MetricComputationError::new(format!(
        "{attribute} on pull request '{}' is a {}, expected a {expected}",
        event.source_id(),
        found.type_name()
    ))
}
