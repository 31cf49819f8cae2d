use crate::engine::{Corpus, SourceProvenance};
use crate::events::{EventKind, TimeWindow};
use crate::metrics::MetricResult;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// The outcome of an analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    generated_at: DateTime<Utc>,
    window: TimeWindow,
    sources: Vec<SourceProvenance>,
    event_count: usize,
    kinds_present: BTreeSet<EventKind>,
    metrics: BTreeMap<CompactString, MetricResult>,
}

impl Report {
    /// Assembles a report.
    ///
    /// Open ends of the configured window are resolved to the earliest and latest event
    /// in the corpus.
    pub(crate) fn new(
        generated_at: DateTime<Utc>,
        configured_window: TimeWindow,
        sources: Vec<SourceProvenance>,
        corpus: &Corpus,
        metrics: Vec<MetricResult>,
    ) -> Self {
        let span = corpus.time_span();
        let window = TimeWindow {
            since: configured_window.since.or_else(|| span.map(|(first, _)| first)),
            until: configured_window.until.or_else(|| span.map(|(_, last)| last)),
        };

        Self {
            generated_at,
            window,
            sources,
            event_count: corpus.len(),
            kinds_present: corpus.kinds(),
            metrics: metrics.into_iter().map(|m| (m.name.clone(), m)).collect(),
        }
    }

    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        self.window
    }

    #[must_use]
    pub fn sources(&self) -> &[SourceProvenance] {
        &self.sources
    }

    /// Adapters that produced at least one event of the corpus.
    pub fn contributing_sources(&self) -> impl Iterator<Item = &SourceProvenance> {
        self.sources.iter().filter(|s| s.events_accepted > 0)
    }

    #[must_use]
    pub const fn event_count(&self) -> usize {
        self.event_count
    }

    #[must_use]
    pub const fn kinds_present(&self) -> &BTreeSet<EventKind> {
        &self.kinds_present
    }

    #[must_use]
    pub fn metric(&self, name: &str) -> Option<&MetricResult> {
        self.metrics.get(name)
    }

    /// All metric results, ordered by name.
    pub fn metrics(&self) -> impl Iterator<Item = &MetricResult> {
        self.metrics.values()
    }

    /// Whether every adapter succeeded and every metric was computed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.sources.iter().all(SourceProvenance::succeeded) && self.metrics.values().all(MetricResult::is_computed)
    }
}
