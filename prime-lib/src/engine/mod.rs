//! Orchestration of an analysis run
//!
//! [`run_analysis`] drives the whole pipeline: it fetches from every source adapter
//! concurrently, validates and merges what they produce into a single [`Corpus`],
//! evaluates every metric against that corpus, and assembles a
//! [`Report`](crate::report::Report).
//!
//! # Failure Handling
//!
//! Failures are contained at the smallest possible scope:
//!
//! - A malformed draft is dropped and counted against its adapter.
//! - A transiently unavailable adapter is retried with exponential backoff. When it is
//!   still failing after the configured number of retries, or when it reports a parse
//!   error, it is marked as failed in the report and the events it produced before
//!   failing are kept.
//! - A metric whose required event kinds are missing is skipped with a warning.
//! - A metric that errors or panics is recorded as failed without affecting others.
//!
//! Only two conditions abort a run: cancellation, and two adapters disagreeing about
//! the kind of the same `(source_system, source_id)` event.

mod analysis_config;
mod corpus;
mod fetch;
mod provenance;
mod run;
mod run_error;

pub use analysis_config::AnalysisConfig;
pub use corpus::{Corpus, CorpusConflict};
pub use provenance::{SourceProvenance, SourceStatus};
pub use run::run_analysis;
pub use run_error::RunError;

const LOG_TARGET: &str = "    engine";
