//! Command-line interface and orchestration for prime
//!
//! This module implements the CLI commands and wires the other modules together to
//! perform an end-to-end analysis. It handles argument parsing, configuration
//! management, and the high-level workflows.
//!
//! ## Commands
//!
//! - **analyze**: Build source adapters and metrics from the configuration file and the
//!   command line, run the analysis, and render the report to the console and/or a
//!   JSON file
//! - **init**: Generate a default configuration file
//! - **validate**: Check configuration file syntax and consistency
//!
//! The `run` function parses command-line arguments using clap and routes
//! to the appropriate command handler.
//!
//! Configuration is managed through a TOML file (`prime.toml` by default) listing the
//! analysis window, retry policy, sources, and metrics. Sources given on the command
//! line are added to those from the file.

mod analyze;
mod common;
mod config;
mod host;
mod init;
mod run;
mod validate;

pub use analyze::{AnalyzeArgs, process_analyze};
pub use common::{ColorMode, LogLevel};
pub use config::Config;
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
