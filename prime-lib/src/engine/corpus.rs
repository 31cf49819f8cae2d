use super::LOG_TARGET;
use crate::events::{Event, EventKey, EventKind};
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

/// Two events share an identity but disagree about their kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusConflict {
    pub key: EventKey,
    pub first_kind: EventKind,
    pub second_kind: EventKind,
}

impl Display for CorpusConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "event '{}' was reported both as {} and as {}",
            self.key, self.first_kind, self.second_kind
        )
    }
}

impl core::error::Error for CorpusConflict {}

/// The deduplicated, time-ordered set of events a run analyzes.
///
/// Events are ordered by timestamp, ties broken by `(source_system, source_id)`, so
/// the order doesn't depend on which adapter finished first.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    events: Vec<Event>,
}

impl Corpus {
    /// Merges batches of events, keeping the first occurrence of each identity.
    ///
    /// # Errors
    ///
    /// Fails when two events share an identity but not a kind.
    pub fn merge(batches: impl IntoIterator<Item = Vec<Event>>) -> Result<Self, CorpusConflict> {
        let mut seen: HashMap<EventKey, EventKind> = HashMap::new();
        let mut events = Vec::new();
        let mut duplicates = 0_usize;

        for event in batches.into_iter().flatten() {
            match seen.entry(event.key().clone()) {
                Entry::Occupied(entry) => {
                    if entry.get() != event.kind() {
                        return Err(CorpusConflict {
                            key: entry.key().clone(),
                            first_kind: entry.get().clone(),
                            second_kind: event.kind().clone(),
                        });
                    }
                    duplicates += 1;
                }
                Entry::Vacant(entry) => {
                    let _ = entry.insert(event.kind().clone());
                    events.push(event);
                }
            }
        }

        if duplicates > 0 {
            log::debug!(target: LOG_TARGET, "Dropped {duplicates} duplicate events while merging");
        }

        events.sort_by(|a, b| a.timestamp().cmp(&b.timestamp()).then_with(|| a.key().cmp(b.key())));
        Ok(Self { events })
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn kinds(&self) -> BTreeSet<EventKind> {
        self.events.iter().map(|e| e.kind().clone()).collect()
    }

    /// Timestamps of the earliest and latest event.
    #[must_use]
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.events.first()?.timestamp(), self.events.last()?.timestamp()))
    }

    /// Number of events contributed by the given adapter.
    #[must_use]
    pub fn count_from(&self, source_system: &str) -> u64 {
        self.events.iter().filter(|e| e.source_system() == source_system).count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventDraft, ValidationPolicy};
    use chrono::TimeZone;
    use core::time::Duration;

    fn event(system: &str, id: &str, kind: EventKind, day: u32) -> Event {
        EventDraft::new()
            .kind(kind)
            .source_id(id)
            .source_system(system)
            .timestamp(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
            .build(&ValidationPolicy::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), Duration::ZERO))
            .unwrap()
    }

    fn ids(corpus: &Corpus) -> Vec<&str> {
        corpus.events().iter().map(Event::source_id).collect()
    }

    #[test]
    fn test_merge_sorts_by_time_then_key() {
        let corpus = Corpus::merge([
            vec![event("git", "c", EventKind::Commit, 3), event("git", "b", EventKind::Commit, 1)],
            vec![event("gh", "7", EventKind::Issue, 1)],
        ])
        .unwrap();

        assert_eq!(ids(&corpus), vec!["7", "b", "c"]);
        assert_eq!(corpus.kinds(), BTreeSet::from([EventKind::Commit, EventKind::Issue]));
    }

    #[test]
    fn test_merge_is_independent_of_batch_order() {
        let a = vec![event("git", "x", EventKind::Commit, 2), event("git", "y", EventKind::Commit, 2)];
        let b = vec![event("gh", "1", EventKind::Issue, 2)];

        let forward = Corpus::merge([a.clone(), b.clone()]).unwrap();
        let backward = Corpus::merge([b, a]).unwrap();
        assert_eq!(ids(&forward), ids(&backward));
    }

    #[test]
    fn test_merge_drops_duplicates() {
        let corpus = Corpus::merge([
            vec![event("git", "a", EventKind::Commit, 1)],
            vec![event("git", "a", EventKind::Commit, 1)],
        ])
        .unwrap();
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_merge_rejects_kind_conflict() {
        let conflict = Corpus::merge([
            vec![event("shared", "1", EventKind::Issue, 1)],
            vec![event("shared", "1", EventKind::PullRequest, 1)],
        ])
        .unwrap_err();

        assert_eq!(conflict.first_kind, EventKind::Issue);
        assert_eq!(conflict.second_kind, EventKind::PullRequest);
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = Corpus::merge(Vec::<Vec<Event>>::new()).unwrap();
        assert!(corpus.is_empty());
        assert!(corpus.time_span().is_none());
        assert!(corpus.kinds().is_empty());
    }

    #[test]
    fn test_count_from() {
        let corpus = Corpus::merge([vec![event("git", "a", EventKind::Commit, 1), event("gh", "1", EventKind::Issue, 1)]]).unwrap();
        assert_eq!(corpus.count_from("git"), 1);
        assert_eq!(corpus.count_from("other"), 0);
    }
}
