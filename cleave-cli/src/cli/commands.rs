//! Command implementations and argument parsing for the `cleave` binary.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cleave_core::{
    CancellationToken, CleaveError, CleaveOutcome, CleaverBuilder, GraphBuilder, GraphSource,
    PartitionStrategy, StoreVersion,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::input::{JsonGraphSource, load_seeds};

const DEFAULT_VERSION: &str = "local";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "cleave", about = "Split an over-merged body using operator seeds.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Returns the output format requested by the command.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        match &self.command {
            Command::Run(run) => run.format,
        }
    }
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Cleave one body described by a JSON file.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Body file: `{"body": id, "supervoxels": [..]?, "edges": [{"u","v","weight","rank"?}]}`.
    #[arg(long)]
    pub graph: PathBuf,

    /// Seed file mapping labels to supervoxels: `{"1": [101, 102], "2": [205]}`.
    #[arg(long)]
    pub seeds: PathBuf,

    /// Store version recorded against the request.
    #[arg(long, default_value = DEFAULT_VERSION)]
    pub version: String,

    /// Partitioning strategy.
    #[arg(long, value_enum, default_value_t = StrategyArg::Seeded)]
    pub strategy: StrategyArg,

    /// Edges below this confidence never drive a merge.
    #[arg(long = "min-merge-weight", default_value_t = 0.0)]
    pub min_merge_weight: f32,

    /// Largest tolerated fraction of edges lying outside the body.
    #[arg(
        long = "foreign-edge-tolerance",
        default_value_t = GraphBuilder::DEFAULT_FOREIGN_EDGE_TOLERANCE,
    )]
    pub foreign_edge_tolerance: f32,

    /// Output format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Fail instead of returning a partially merged result.
    #[arg(long)]
    pub strict: bool,

    /// Keep the agglomeration trace in the output.
    #[arg(long)]
    pub trace: bool,
}

/// Partitioning strategies selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Single pass over edges sorted by confidence.
    Seeded,
    /// Merge components by highest mean connecting confidence.
    MeanAffinity,
}

impl From<StrategyArg> for PartitionStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Seeded => Self::SeededAgglomeration,
            StrategyArg::MeanAffinity => Self::MeanAffinity,
        }
    }
}

/// Output formats for [`render_summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented text.
    Human,
    /// A single JSON document.
    Json,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// An input file could not be opened.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An input file was not valid JSON of the expected shape.
    #[error("failed to parse `{path}`: {source}")]
    Json {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A seed file key was not an unsigned integer label.
    #[error("seed label `{label}` is not an unsigned integer")]
    InvalidSeedLabel {
        /// Offending key.
        label: String,
    },
    /// The engine rejected the request.
    #[error(transparent)]
    Core(#[from] CleaveError),
}

/// Outcome of a `run` command.
#[derive(Debug, Clone, Serialize)]
pub struct CleaveSummary {
    /// Name of the graph source, derived from the body file name.
    pub source: String,
    /// Version recorded against the request.
    pub version: StoreVersion,
    /// Strategy that produced the partition.
    pub strategy: PartitionStrategy,
    /// Engine outcome.
    pub outcome: CleaveOutcome,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when an input cannot be loaded or the cleave fails.
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<CleaveSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", "run");
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(strategy = field::Empty, strict = command.strict),
)]
pub(super) fn run_command(command: RunCommand) -> Result<CleaveSummary, CliError> {
    let strategy = PartitionStrategy::from(command.strategy);
    Span::current().record("strategy", field::display(strategy));
    let cleaver = CleaverBuilder::new()
        .with_strategy(strategy)
        .with_min_merge_weight(command.min_merge_weight)
        .with_foreign_edge_tolerance(command.foreign_edge_tolerance)
        .with_record_trace(command.trace)
        .build()?;

    let source = JsonGraphSource::from_path(&command.graph)?;
    let seeds = load_seeds(&command.seeds)?;
    let version = StoreVersion::new(command.version);
    let outcome = cleaver.cleave(
        &source,
        source.body(),
        &version,
        &seeds,
        &CancellationToken::new(),
    )?;
    let outcome = if command.strict {
        CleaveOutcome::Separated(outcome.into_separated()?)
    } else {
        outcome
    };

    info!(
        body = %source.body(),
        groups = outcome.result().groups().len(),
        separated = outcome.is_separated(),
        "command completed"
    );
    Ok(CleaveSummary {
        source: source.name().to_owned(),
        version,
        strategy,
        outcome,
    })
}

/// Renders `summary` to `writer` in the requested format.
///
/// # Errors
/// Returns [`io::Error`] if writing or JSON serialisation fails.
pub fn render_summary(
    summary: &CleaveSummary,
    format: OutputFormat,
    mut writer: impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, summary)?;
            writeln!(writer)
        }
        OutputFormat::Human => render_human(summary, writer),
    }
}

fn render_human(summary: &CleaveSummary, mut writer: impl Write) -> io::Result<()> {
    let result = summary.outcome.result();
    writeln!(
        writer,
        "body {} at {} ({}, {})",
        result.body(),
        summary.version,
        summary.source,
        summary.strategy
    )?;
    let status = if summary.outcome.is_separated() {
        "separated"
    } else {
        "partially merged"
    };
    writeln!(writer, "outcome: {status}")?;
    for warning in summary.outcome.unreachable() {
        let seeds: Vec<String> = warning.seeds.iter().map(ToString::to_string).collect();
        writeln!(
            writer,
            "warning: seeds {} of label {} could not be joined",
            seeds.join(", "),
            warning.label
        )?;
    }

    writeln!(writer, "groups: {}", result.groups().len())?;
    for group in result.groups() {
        let label = group
            .label()
            .map_or_else(|| "-".to_owned(), |label| label.to_string());
        let boundary = group
            .strongest_boundary()
            .map_or_else(|| "-".to_owned(), |weight| weight.to_string());
        writeln!(
            writer,
            "{}\t{}\tlabel={label}\tsize={}\tboundary={boundary}",
            group.id(),
            group.kind().as_str(),
            group.size(),
        )?;
    }

    writeln!(writer, "cut edges: {}", result.cut_edges().len())?;
    for edge in result.cut_edges() {
        writeln!(writer, "{}\t{}\t{}", edge.source, edge.target, edge.weight)?;
    }
    writeln!(writer, "assignments:")?;
    for (supervoxel, group) in result.assignments() {
        writeln!(writer, "{supervoxel}\t{group}")?;
    }
    Ok(())
}
