//! Command argument structures

use std::path::PathBuf;

use clap::Args;

/// Arguments for the init command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing gradeflow.toml
    #[arg(long)]
    pub force: bool,
}

/// Where the reference index comes from.
#[derive(Args, Debug, Clone)]
pub struct IndexSourceArgs {
    /// Load a saved index directory
    #[arg(long, conflicts_with = "reference", required_unless_present = "reference")]
    pub index: Option<PathBuf>,

    /// Build the index from this reference (instructor) directory
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Acknowledge that the index directory comes from a trusted source
    #[arg(long, requires = "index")]
    pub trust_index: bool,
}

/// Arguments for the index command.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Reference (instructor) directory
    pub reference: PathBuf,

    /// Directory to write the index to
    #[arg(long, short, default_value = "index")]
    pub output: PathBuf,

    /// Submission directories to include in the chunk summary
    #[arg(long, action = clap::ArgAction::Append)]
    pub submission: Vec<PathBuf>,

    /// Also write the chunk summary to this file
    #[arg(long)]
    pub summary_file: Option<PathBuf>,
}

/// Arguments for the grade command.
#[derive(Args, Debug)]
pub struct GradeArgs {
    /// Submission (student) directories
    #[arg(required = true)]
    pub submissions: Vec<PathBuf>,

    #[command(flatten)]
    pub source: IndexSourceArgs,

    /// Save the freshly built index to this directory
    #[arg(long, requires = "reference")]
    pub save_index: Option<PathBuf>,

    /// Feedback report file
    #[arg(long, short, default_value = "feedback.txt")]
    pub output: PathBuf,

    /// Scoring workers (overrides pipeline.workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Reference neighbors retrieved per chunk (overrides retrieval.neighbor_count)
    #[arg(long)]
    pub neighbors: Option<usize>,
}

/// Arguments for the similar command.
#[derive(Args, Debug)]
pub struct SimilarArgs {
    /// Submission (student) directories
    #[arg(required = true)]
    pub submissions: Vec<PathBuf>,

    #[command(flatten)]
    pub source: IndexSourceArgs,

    /// Number of leading submission chunks to preview
    #[arg(long, short = 'n', default_value_t = 5)]
    pub count: usize,

    /// Reference matches per chunk
    #[arg(long, short, default_value_t = 2)]
    pub k: usize,

    /// Write the preview to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}
