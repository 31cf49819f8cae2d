use super::{AttributeValue, Attributes, EventKind};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use core::fmt::{Display, Formatter};
use core::hash::{Hash, Hasher};
use serde::Serialize;

/// Actor recorded when the source system doesn't identify who performed an action.
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Identity of an event across the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EventKey {
    pub source_system: CompactString,
    pub source_id: CompactString,
}

impl Display for EventKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.source_system, self.source_id)
    }
}

/// A single normalized activity record.
///
/// Events are created through [`EventDraft::build`](super::EventDraft::build) and are
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct Event {
    pub(super) kind: EventKind,
    pub(super) key: EventKey,
    pub(super) timestamp: DateTime<Utc>,
    pub(super) actor: CompactString,
    pub(super) attributes: Attributes,
}

impl Event {
    #[must_use]
    pub const fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Identifier of the record within its source system (commit hash, issue number, ...).
    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.key.source_id
    }

    /// Identity of the adapter that produced this event.
    #[must_use]
    pub fn source_system(&self) -> &str {
        &self.key.source_system
    }

    #[must_use]
    pub const fn key(&self) -> &EventKey {
        &self.key
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Who performed the action, or [`UNKNOWN_ACTOR`].
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    #[must_use]
    pub fn has_known_actor(&self) -> bool {
        !self.actor.is_empty() && self.actor != UNKNOWN_ACTOR
    }

    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
