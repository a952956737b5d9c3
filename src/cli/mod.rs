//! CLI argument parsing for gradeflow
//!
//! Global flags: --config, --root, --format, --quiet, --verbose, --log-level, --log-json

pub mod args;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{GradeArgs, IndexArgs, IndexSourceArgs, InitArgs, SimilarArgs};
pub use output::OutputFormat;

/// gradeflow - rubric grading with reference context
#[derive(Parser, Debug)]
#[command(name = "gradeflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ./gradeflow.toml, then the user config directory)
    #[arg(long, global = true, env = "GRADEFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base directory for relative paths
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log filter, either a level or a full directive (e.g. `gradeflow_core=trace`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default configuration to gradeflow.toml
    Init(InitArgs),

    /// Build and save a reference index
    Index(IndexArgs),

    /// Grade submissions and write a feedback report
    Grade(GradeArgs),

    /// Show the closest reference chunks for the first submission chunks
    Similar(SimilarArgs),
}
