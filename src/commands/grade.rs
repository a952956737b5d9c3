//! `gradeflow grade` command - run the full grading pipeline

use gradeflow_core::error::{GradeError, Result};
use gradeflow_core::pipeline::{CancelToken, PipelineInput};
use gradeflow_core::report::{NullSink, Report, TextReportFile};

use crate::cli::{GradeArgs, OutputFormat};
use crate::commands::dispatch::CommandContext;

/// Execute the grade command
pub fn execute(ctx: &CommandContext, args: &GradeArgs) -> Result<()> {
    let mut config = ctx.load_config()?;
    if let Some(workers) = args.workers {
        config.pipeline.workers = workers;
    }
    if let Some(neighbors) = args.neighbors {
        config.retrieval.neighbor_count = neighbors;
    }

    let token = CancelToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    let pipeline = ctx.pipeline(config)?.with_cancel_token(token);
    let input = PipelineInput {
        submission_roots: ctx.resolve_all(&args.submissions),
        index: ctx.index_source(&args.source, args.save_index.as_deref()),
    };

    let report = match ctx.cli.format {
        OutputFormat::Json => {
            let report = pipeline.run(&input, &mut NullSink)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            report
        }
        OutputFormat::Human => {
            let mut sink = TextReportFile::new(ctx.resolve(&args.output));
            let report = pipeline.run(&input, &mut sink)?;
            if !ctx.cli.quiet {
                print_outcome(&report, &sink.path().display().to_string());
            }
            report
        }
    };
    tracing::debug!(elapsed = ?ctx.start.elapsed(), "grade");

    if report.partial {
        return Err(GradeError::Interrupted);
    }
    Ok(())
}

fn print_outcome(report: &Report, path: &str) {
    let summary = &report.summary;
    println!(
        "Graded {} chunks from {} submission files.",
        report.entries.len(),
        summary.submission_documents
    );
    if !summary.skipped.is_empty() || !summary.missing_roots.is_empty() {
        println!(
            "Skipped {} files and {} missing directories (see report).",
            summary.skipped.len(),
            summary.missing_roots.len()
        );
    }
    println!("Final Project Score: {}/100", report.aggregate);
    println!("Feedback saved to {}", path);
}
