//! Command trait and context for dispatching commands

use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use gradeflow_core::config::GradeConfig;
use gradeflow_core::embedding::provider_from_config;
use gradeflow_core::error::Result;
use gradeflow_core::index::Trust;
use gradeflow_core::pipeline::{IndexSource, Pipeline};

use crate::cli::{Cli, IndexSourceArgs};

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    /// Base for relative paths: `--root`, else the working directory
    pub root: PathBuf,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, start: Instant) -> Self {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self { cli, root, start }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Discover and validate the configuration for this invocation
    pub fn load_config(&self) -> Result<GradeConfig> {
        let explicit = self.cli.config.as_deref().map(|p| self.resolve(p));
        let (config, path) = GradeConfig::discover(explicit.as_deref(), &self.root)?;
        match &path {
            Some(path) => tracing::debug!(path = %path.display(), "loaded configuration"),
            None => tracing::debug!("using built-in configuration"),
        }
        config.validate()?;
        Ok(config)
    }

    /// Assemble a pipeline with the configured embedding provider
    pub fn pipeline(&self, config: GradeConfig) -> Result<Pipeline> {
        let provider = provider_from_config(&config.embedding)?;
        Pipeline::new(config, provider)
    }

    pub fn index_source(&self, args: &IndexSourceArgs, save_to: Option<&Path>) -> IndexSource {
        match (&args.index, &args.reference) {
            (Some(path), _) => IndexSource::Load {
                path: self.resolve(path),
                trust: if args.trust_index {
                    Trust::Acknowledged
                } else {
                    Trust::Unverified
                },
            },
            (None, reference) => IndexSource::Build {
                reference_root: self.resolve(reference.as_deref().unwrap_or(Path::new("."))),
                save_to: save_to.map(|p| self.resolve(p)),
            },
        }
    }

    pub fn resolve_all(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths.iter().map(|p| self.resolve(p)).collect()
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("gradeflow {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Rubric grading of submitted code against a reference solution.");
        println!();
        println!("Run `gradeflow --help` for usage information.");
        Ok(())
    }
}
