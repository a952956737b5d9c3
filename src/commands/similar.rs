//! `gradeflow similar` command - preview retrieval without scoring

use std::fs;

use gradeflow_core::chunk::Chunk;
use gradeflow_core::error::Result;
use gradeflow_core::pipeline::PipelineInput;
use gradeflow_core::report::{truncate_chars, NeighborPreview};
use serde::Serialize;

use crate::cli::{OutputFormat, SimilarArgs};
use crate::commands::dispatch::CommandContext;

const RULE: &str = "==============================";

#[derive(Debug, Serialize)]
struct Preview<'a> {
    position: usize,
    source: &'a str,
    ordinal: usize,
    text: &'a str,
    matches: Vec<NeighborPreview>,
}

/// Execute the similar command
pub fn execute(ctx: &CommandContext, args: &SimilarArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let pipeline = ctx.pipeline(config)?;
    let input = PipelineInput {
        submission_roots: ctx.resolve_all(&args.submissions),
        index: ctx.index_source(&args.source, None),
    };
    let prepared = pipeline.prepare(&input)?;
    tracing::debug!(elapsed = ?ctx.start.elapsed(), "prepare");

    let preview_len = pipeline.config().report.chunk_preview;
    let mut previews = Vec::new();
    for (position, chunk) in prepared.chunks.iter().take(args.count).enumerate() {
        let neighbors = prepared
            .index
            .query_text(pipeline.provider(), &chunk.text, args.k)?;
        previews.push(Preview {
            position,
            source: &chunk.source,
            ordinal: chunk.ordinal,
            text: &chunk.text,
            matches: neighbors
                .iter()
                .map(|n| NeighborPreview {
                    id: n.id,
                    similarity: n.similarity,
                    source: n.chunk.source.clone(),
                    ordinal: n.chunk.ordinal,
                    text: truncate_chars(&n.chunk.text, preview_len).to_string(),
                })
                .collect(),
        });
    }

    let rendered = match ctx.cli.format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&previews)?),
        OutputFormat::Human => render_human(&previews, &prepared.chunks),
    };

    match &args.output {
        Some(path) => {
            let path = ctx.resolve(path);
            fs::write(&path, rendered)?;
            if !ctx.cli.quiet && ctx.cli.format == OutputFormat::Human {
                println!("Similarity results saved to {}", path.display());
            }
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn render_human(previews: &[Preview<'_>], chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for preview in previews {
        out.push_str(&format!(
            "{RULE}\nChunk #{} ({}, part {})\n{RULE}\n{}\n\n",
            preview.position + 1,
            preview.source,
            preview.ordinal + 1,
            preview.text
        ));
        out.push_str("Closest reference chunks:\n");
        if preview.matches.is_empty() {
            out.push_str("(none)\n");
        }
        for (rank, m) in preview.matches.iter().enumerate() {
            out.push_str(&format!(
                "\n--- Match #{} ({}, part {}, similarity {:.3}) ---\n{}\n",
                rank + 1,
                m.source,
                m.ordinal + 1,
                m.similarity,
                m.text
            ));
        }
        out.push_str("\n\n");
    }
    if previews.len() < chunks.len() {
        out.push_str(&format!(
            "Showed {} of {} submission chunks.\n",
            previews.len(),
            chunks.len()
        ));
    }
    out
}
