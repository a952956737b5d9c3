//! `gradeflow index` command - build and save a reference index

use std::fs;

use gradeflow_core::collect::collect_documents;
use gradeflow_core::document::Origin;
use gradeflow_core::error::{GradeError, Result};
use gradeflow_core::index::IndexManifest;
use gradeflow_core::report::RunSummary;

use crate::cli::{IndexArgs, OutputFormat};
use crate::commands::dispatch::CommandContext;

/// Execute the index command
pub fn execute(ctx: &CommandContext, args: &IndexArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let pipeline = ctx.pipeline(config)?;
    let mut summary = RunSummary::default();

    let index = pipeline.build_index(&ctx.resolve(&args.reference), &mut summary)?;
    tracing::debug!(elapsed = ?ctx.start.elapsed(), "build_index");

    for root in ctx.resolve_all(&args.submission) {
        match collect_documents(&root, Origin::Student, &pipeline.config().collection) {
            Ok(collected) => {
                summary.submission_documents += collected.documents.len();
                summary.submission_chunks += pipeline.chunk_all(&collected.documents).len();
                summary.skipped.extend(collected.skipped);
            }
            Err(GradeError::SourceNotFound { root }) => {
                tracing::warn!(root = %root.display(), "submission directory not found");
                summary.missing_roots.push(root);
            }
            Err(e) => return Err(e),
        }
    }

    let output = ctx.resolve(&args.output);
    let manifest = index.save(&output)?;
    tracing::debug!(elapsed = ?ctx.start.elapsed(), "save_index");

    let text = summary_text(&summary);
    if let Some(path) = &args.summary_file {
        fs::write(ctx.resolve(path), &text)?;
    }

    match ctx.cli.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "index": output.display().to_string(),
                "manifest": manifest,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Human => {
            if !ctx.cli.quiet {
                print!("{}", text);
                print_saved(&output.display().to_string(), &manifest);
            }
        }
    }
    Ok(())
}

fn summary_text(summary: &RunSummary) -> String {
    let mut text = format!(
        "Loaded {} reference files.\nLoaded {} submission files.\nReference chunks: {}\nSubmission chunks: {}\n",
        summary.reference_documents,
        summary.submission_documents,
        summary.reference_chunks,
        summary.submission_chunks
    );
    for root in &summary.missing_roots {
        text.push_str(&format!("Missing directory: {}\n", root.display()));
    }
    for skipped in &summary.skipped {
        text.push_str(&format!(
            "Skipped {}: {}\n",
            skipped.path.display(),
            skipped.reason
        ));
    }
    text
}

fn print_saved(path: &str, manifest: &IndexManifest) {
    println!(
        "Saved index to {} ({} entries, dimension {}, build {})",
        path, manifest.count, manifest.dimension, manifest.build_id
    );
}
