//! CLI argument definitions for `recon`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use recon_model::PairingMode;

#[derive(Parser)]
#[command(
    name = "recon",
    version,
    about = "Suggest column mappings and table pairings between two datasets",
    long_about = "Suggest column mappings and table pairings between two datasets.\n\n\
                  `match` scores every left column against every right column.\n\
                  `pair` pairs left tables with right tables one-to-one."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score column mappings between two tables.
    Match(MatchArgs),

    /// Pair the tables of two schemas one-to-one.
    Pair(PairArgs),
}

#[derive(Parser)]
pub struct MatchArgs {
    /// Left table as JSON (name, columns with dtype and values).
    #[arg(long = "left", value_name = "FILE")]
    pub left: PathBuf,

    /// Right table as JSON.
    #[arg(long = "right", value_name = "FILE")]
    pub right: PathBuf,

    /// Confidence at or above which a mapping is auto-accepted.
    #[arg(long = "threshold", value_name = "T")]
    pub threshold: Option<f64>,

    /// Values sampled per column for overlap (defaults to the configured value).
    #[arg(long = "sample-n", value_name = "N")]
    pub sample_n: Option<usize>,

    /// Show every candidate instead of only the best pick per left column.
    #[arg(long = "all")]
    pub all: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser)]
pub struct PairArgs {
    /// Left schema as a JSON array of table profiles.
    #[arg(long = "left", value_name = "FILE")]
    pub left: PathBuf,

    /// Right schema as a JSON array of table profiles.
    #[arg(long = "right", value_name = "FILE")]
    pub right: PathBuf,

    /// Minimum score for a pair to be kept.
    #[arg(long = "min-score", value_name = "S")]
    pub min_score: Option<f64>,

    /// Pairing strictness.
    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser)]
pub struct CommonArgs {
    /// Settings file (JSON). Environment overrides still apply on top.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the full result as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI pairing mode choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Strict,
    Balanced,
    Lenient,
}

impl From<ModeArg> for PairingMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Strict => PairingMode::Strict,
            ModeArg::Balanced => PairingMode::Balanced,
            ModeArg::Lenient => PairingMode::Lenient,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
