//! Command dispatch logic for gradeflow

use std::time::Instant;

use gradeflow_core::error::Result;
use tracing::debug;

use crate::cli::{Cli, Commands};

mod command;

pub use command::CommandContext;
use command::{Command, NoCommand};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let ctx = CommandContext::new(cli, start);

    debug!(elapsed = ?start.elapsed(), root = %ctx.root.display(), "resolve_root");

    match &cli.command {
        None => NoCommand.execute(&ctx),
        Some(cmd) => cmd.execute(&ctx),
    }
}

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Commands::Init(args) => crate::commands::init::execute(ctx, args),
            Commands::Index(args) => crate::commands::index::execute(ctx, args),
            Commands::Grade(args) => crate::commands::grade::execute(ctx, args),
            Commands::Similar(args) => crate::commands::similar::execute(ctx, args),
        }
    }
}
