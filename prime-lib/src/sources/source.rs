use super::SourceError;
use crate::events::{EventDraft, TimeWindow};
use core::fmt::Debug;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The lazily-produced output of a single fetch.
///
/// A stream that yields an error is finished: the engine stops polling it.
pub type EventStream<'a> = BoxStream<'a, Result<EventDraft, SourceError>>;

/// The broad category of external system an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceFamily {
    Vcs,
    IssueTracker,
    PullRequestTracker,
}

/// An adapter that turns the records of an external system into event drafts.
pub trait Source: Send + Sync + Debug {
    /// Stable identifier of this adapter, stamped as the `source_system` of every event it produces.
    fn identity(&self) -> &str;

    fn family(&self) -> SourceFamily;

    /// Starts a fresh fetch of all records falling inside `window`.
    ///
    /// Nothing happens until the returned stream is polled.
    fn fetch(&self, window: TimeWindow) -> EventStream<'_>;
}
