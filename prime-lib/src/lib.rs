#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for prime
//!
//! This library mines activity from source code repositories and their issue and pull
//! request trackers, normalizes it into a single time-ordered corpus of events, and
//! computes metrics over that corpus.
//!
//! # Module Organization
//!
//! - [`events`]: The normalized event model
//! - [`sources`]: Adapters that fetch events from external systems
//! - [`metrics`]: Metric definitions and reference implementations
//! - [`engine`]: Orchestration of an analysis run
//! - [`report`]: Report assembly and rendering
//! - [`commands`]: Command-line interface

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod engine;
pub mod events;
pub mod metrics;
pub mod report;
pub mod sources;

pub use crate::commands::{Host, run};
