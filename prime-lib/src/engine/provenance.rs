use crate::sources::SourceFamily;
use compact_str::CompactString;
use serde::Serialize;

/// How an adapter's fetch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded,
    Failed { reason: String },
}

/// What a single adapter contributed to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceProvenance {
    pub name: CompactString,
    pub family: SourceFamily,

    #[serde(flatten)]
    pub status: SourceStatus,

    /// Number of fetch attempts, including the first.
    pub attempts: u32,

    /// Events from this adapter that made it into the corpus.
    pub events_accepted: u64,

    /// Drafts from this adapter that were dropped as malformed or out of window.
    pub events_rejected: u64,
}

impl SourceProvenance {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.status, SourceStatus::Succeeded)
    }
}
