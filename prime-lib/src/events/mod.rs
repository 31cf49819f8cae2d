//! Normalized activity records
//!
//! Every source adapter maps the records of its external system (commits, issues,
//! pull requests, ...) into the common [`Event`] type defined here. Everything above
//! this module (the corpus, metrics, reports) only ever sees events.
//!
//! # Implementation Model
//!
//! Adapters never construct an [`Event`] directly. They produce an [`EventDraft`],
//! a builder whose fields are all optional, and the engine turns drafts into events
//! through [`EventDraft::build`]. Validation happens at that single point, against a
//! [`ValidationPolicy`] that carries the run's clock and the tolerated clock skew, so
//! a draft missing a required field or stamped too far into the future fails with a
//! [`MalformedEventError`] naming the offending field.
//!
//! Once built, an event is immutable. Two events are equal when they share the same
//! `(source_system, source_id)` pair, which is also the key used for deduplication.
//!
//! Kind-specific data lives in a typed attribute map whose keys are namespaced by the
//! event kind (e.g. `commit.lines_added`, `issue.closed_at`).

mod attribute_value;
mod event;
mod event_draft;
mod event_kind;
mod malformed_event_error;
mod time_window;

pub use attribute_value::{AttributeValue, Attributes};
pub use event::{Event, EventKey, UNKNOWN_ACTOR};
pub use event_draft::{EventDraft, ValidationPolicy};
pub use event_kind::EventKind;
pub use malformed_event_error::{EventField, MalformedEventError};
pub use time_window::TimeWindow;
