//! Source adapters
//!
//! A source adapter pulls activity from one external system and yields it as a stream
//! of [`EventDraft`](crate::events::EventDraft)s. Adapters are grouped in three families:
//! version control ([`GitSource`]), issue tracking ([`GitHubIssuesSource`]) and pull
//! request tracking ([`GitHubPullsSource`]). [`EventsFileSource`] reads pre-normalized
//! exports and can stand in for any family.
//!
//! Adapters are stateless with respect to a run: each call to [`Source::fetch`] starts
//! over from scratch, which is what lets the engine retry a failed fetch.

mod events_file;
mod git;
mod github;
mod source;
mod source_error;
mod source_spec;

pub use events_file::EventsFileSource;
pub use git::GitSource;
pub use github::{DEFAULT_GITHUB_API_URL, GitHubIssuesSource, GitHubPullsSource};
pub use source::{EventStream, Source, SourceFamily};
pub use source_error::SourceError;
pub use source_spec::SourceSpec;
