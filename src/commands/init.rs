//! `gradeflow init` command - write the default configuration

use gradeflow_core::config::{GradeConfig, CONFIG_FILE_NAME};
use gradeflow_core::error::{GradeError, Result};

use crate::cli::{InitArgs, OutputFormat};
use crate::commands::dispatch::CommandContext;

/// Execute the init command
pub fn execute(ctx: &CommandContext, args: &InitArgs) -> Result<()> {
    let path = ctx.root.join(CONFIG_FILE_NAME);
    if path.exists() && !args.force {
        return Err(GradeError::UsageError(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    GradeConfig::default().save(&path)?;
    tracing::info!(path = %path.display(), "wrote default configuration");

    match ctx.cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "config": path.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !ctx.cli.quiet {
                println!("Wrote default configuration to {}", path.display());
            }
        }
    }
    Ok(())
}
