use compact_str::CompactString;
use core::fmt::{Display, Formatter};
use strum::Display;

/// The event field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventField {
    Kind,
    SourceId,
    SourceSystem,
    Timestamp,
    Attributes,
}

/// A draft could not be turned into an [`Event`](super::Event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEventError {
    pub field: EventField,
    pub reason: CompactString,

    /// The draft's source id, when it had one.
    pub source_id: Option<CompactString>,
}

impl MalformedEventError {
    pub(super) fn new(field: EventField, reason: impl Into<CompactString>, source_id: Option<&CompactString>) -> Self {
        Self {
            field,
            reason: reason.into(),
            source_id: source_id.cloned(),
        }
    }
}

impl Display for MalformedEventError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match &self.source_id {
            Some(id) => write!(f, "malformed event '{id}': {} {}", self.field, self.reason),
            None => write!(f, "malformed event: {} {}", self.field, self.reason),
        }
    }
}

impl core::error::Error for MalformedEventError {}
