//! Command-line interface for running cleaves against local files.
//!
//! The single `run` command loads a body graph and operator seeds from JSON,
//! cleaves the body through a file-backed graph source and renders the
//! outcome as text or JSON.

mod commands;
mod input;

pub use commands::{
    Cli, CliError, CleaveSummary, Command, OutputFormat, RunCommand, StrategyArg,
    render_summary, run_cli,
};
pub use input::{JsonGraphSource, load_seeds};
