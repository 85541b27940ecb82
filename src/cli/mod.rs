//! Command-line interface for repro-forge.
//!
//! Provides commands for running the full pipeline, evaluating an existing
//! demonstration and scanning a repository.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
