use crate::events::{AttributeValue, Event, EventKind};
use compact_str::CompactString;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A literal an attribute is compared against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Boolean(bool),
    Number(f64),
    String(CompactString),
}

impl FilterValue {
    /// String attributes match either as a whole or on any of their comma-separated items,
    /// so `"bug"` matches an `issue.labels` value of `"bug,ui"`.
    #[expect(clippy::float_cmp, reason = "filters compare exact values")]
    fn matches(&self, value: &AttributeValue) -> bool {
        match (self, value) {
            (Self::Boolean(a), AttributeValue::Boolean(b)) => a == b,
            (Self::Number(a), AttributeValue::Number(b)) => a == b,
            (Self::String(a), AttributeValue::String(b)) => a == b || b.split(',').any(|item| item.trim() == a.as_str()),
            _ => false,
        }
    }
}

/// Restricts the events a metric consumes. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFilter {
    /// Only events performed by one of these actors.
    #[serde(default)]
    pub actors: Vec<CompactString>,

    /// Only events of one of these kinds.
    #[serde(default)]
    pub kinds: Vec<EventKind>,

    /// Only events whose attributes hold all of these values.
    #[serde(default)]
    pub attribute_equals: BTreeMap<CompactString, FilterValue>,
}

impl EventFilter {
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        (self.actors.is_empty() || self.actors.iter().any(|a| a.eq_ignore_ascii_case(event.actor())))
            && (self.kinds.is_empty() || self.kinds.contains(event.kind()))
            && self
                .attribute_equals
                .iter()
                .all(|(key, expected)| event.attribute(key).is_some_and(|v| expected.matches(v)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.kinds.is_empty() && self.attribute_equals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{day, draft, policy};

    fn labelled_issue(labels: &str) -> Event {
        draft(EventKind::Issue, "1", day(1), "alice")
            .attribute("issue.labels", labels)
            .attribute("issue.comments", 2_u64)
            .build(&policy())
            .unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = EventFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&labelled_issue("")));
    }

    #[test]
    fn test_actor_filter() {
        let filter = EventFilter {
            actors: vec!["Alice".into()],
            ..EventFilter::default()
        };
        assert!(filter.matches(&labelled_issue("")));

        let filter = EventFilter {
            actors: vec!["bob".into()],
            ..EventFilter::default()
        };
        assert!(!filter.matches(&labelled_issue("")));
    }

    #[test]
    fn test_kind_filter() {
        let filter = EventFilter {
            kinds: vec![EventKind::Commit],
            ..EventFilter::default()
        };
        assert!(!filter.matches(&labelled_issue("")));
    }

    #[test]
    fn test_attribute_filter_matches_list_items() {
        let filter = EventFilter {
            attribute_equals: BTreeMap::from([(CompactString::from("issue.labels"), FilterValue::String("bug".into()))]),
            ..EventFilter::default()
        };

        assert!(filter.matches(&labelled_issue("bug,ui")));
        assert!(!filter.matches(&labelled_issue("debug")));
    }

    #[test]
    fn test_attribute_filter_type_mismatch() {
        let filter = EventFilter {
            attribute_equals: BTreeMap::from([(CompactString::from("issue.comments"), FilterValue::String("2".into()))]),
            ..EventFilter::default()
        };
        assert!(!filter.matches(&labelled_issue("")));

        let filter = EventFilter {
            attribute_equals: BTreeMap::from([(CompactString::from("issue.comments"), FilterValue::Number(2.0))]),
            ..EventFilter::default()
        };
        assert!(filter.matches(&labelled_issue("")));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let filter: EventFilter = toml::from_str(
            r#"
            actors = ["alice"]
            kinds = ["issue"]
            attribute_equals = { "issue.labels" = "bug", "issue.comments" = 2 }
            "#,
        )
        .unwrap();

        assert_eq!(filter.kinds, vec![EventKind::Issue]);
        assert_eq!(filter.attribute_equals.get("issue.comments"), Some(&FilterValue::Number(2.0)));
    }
}
