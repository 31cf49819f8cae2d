use super::{AttributeValue, Attributes, Event, EventField, EventKey, EventKind, MalformedEventError, UNKNOWN_ACTOR};
use chrono::{DateTime, TimeDelta, Utc};
use compact_str::CompactString;

/// The rules a draft is validated against when turned into an [`Event`].
#[derive(Debug, Clone, Copy)]
pub struct ValidationPolicy {
    /// The run's notion of the current time.
    pub now: DateTime<Utc>,

    /// How far into the future a timestamp may lie before it is considered bogus.
    pub clock_skew_tolerance: TimeDelta,
}

impl ValidationPolicy {
    #[must_use]
    pub fn new(now: DateTime<Utc>, clock_skew_tolerance: core::time::Duration) -> Self {
        Self {
            now,
            clock_skew_tolerance: TimeDelta::from_std(clock_skew_tolerance).unwrap_or(TimeDelta::MAX),
        }
    }
}

/// An event under construction.
///
/// Every field is optional while building. [`EventDraft::build`] checks that the
/// required ones are present and well-formed.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    kind: Option<EventKind>,
    source_id: Option<CompactString>,
    source_system: Option<CompactString>,
    timestamp: Option<DateTime<Utc>>,
    actor: Option<CompactString>,
    attributes: Attributes,
}

impl EventDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn source_id(mut self, id: impl Into<CompactString>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn source_system(mut self, system: impl Into<CompactString>) -> Self {
        self.source_system = Some(system.into());
        self
    }

    #[must_use]
    pub const fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: impl Into<CompactString>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    #[must_use]
    pub fn actor_opt(mut self, actor: Option<impl Into<CompactString>>) -> Self {
        self.actor = actor.map(Into::into);
        self
    }

    /// Sets an attribute. A later call with the same key replaces the earlier value.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<CompactString>, value: impl Into<AttributeValue>) -> Self {
        let _ = self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets an attribute only when a value is present.
    #[must_use]
    pub fn attribute_opt<V: Into<AttributeValue>>(self, key: impl Into<CompactString>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attribute(key, v),
            None => self,
        }
    }

    #[must_use]
    pub fn get_source_system(&self) -> Option<&str> {
        self.source_system.as_deref()
    }

    #[must_use]
    pub const fn get_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Validates the draft and turns it into an immutable [`Event`].
    ///
    /// # Errors
    ///
    /// Fails when a required field is missing or empty, when the timestamp lies further
    /// in the future than the policy tolerates, or when an attribute key is not
    /// namespaced by the event's kind.
    pub fn build(self, policy: &ValidationPolicy) -> Result<Event, MalformedEventError> {
        let id = self.source_id.as_ref();

        let source_id = match &self.source_id {
            Some(s) if !s.trim().is_empty() => s.clone(),
            Some(_) => return Err(MalformedEventError::new(EventField::SourceId, "is empty", id)),
            None => return Err(MalformedEventError::new(EventField::SourceId, "is missing", id)),
        };

        let Some(kind) = self.kind else {
            return Err(MalformedEventError::new(EventField::Kind, "is missing", id));
        };

        if let EventKind::Other(name) = &kind
            && name.is_empty()
        {
            return Err(MalformedEventError::new(EventField::Kind, "is empty", id));
        }

        let source_system = match self.source_system {
            Some(s) if !s.trim().is_empty() => s,
            Some(_) => return Err(MalformedEventError::new(EventField::SourceSystem, "is empty", id)),
            None => return Err(MalformedEventError::new(EventField::SourceSystem, "is missing", id)),
        };

        let Some(timestamp) = self.timestamp else {
            return Err(MalformedEventError::new(EventField::Timestamp, "is missing", id));
        };

        let latest = policy.now.checked_add_signed(policy.clock_skew_tolerance).unwrap_or(DateTime::<Utc>::MAX_UTC);
        if timestamp > latest {
            return Err(MalformedEventError::new(
                EventField::Timestamp,
                format!("{} lies in the future (now is {})", timestamp.to_rfc3339(), policy.now.to_rfc3339()),
                id,
            ));
        }

        let namespace = kind.namespace();
        if let Some(bad_key) = self.attributes.keys().find(|k| !is_in_namespace(k, namespace)) {
            return Err(MalformedEventError::new(
                EventField::Attributes,
                format!("key '{bad_key}' is not in the '{namespace}.' namespace"),
                id,
            ));
        }

        let actor = self
            .actor
            .map(|a| CompactString::from(a.trim()))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_ACTOR.into());

        Ok(Event {
            kind,
            key: EventKey { source_system, source_id },
            timestamp,
            actor,
            attributes: self.attributes,
        })
    }
}

fn is_in_namespace(key: &str, namespace: &str) -> bool {
    key.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|field| !field.is_empty())
}
