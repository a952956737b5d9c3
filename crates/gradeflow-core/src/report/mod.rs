//! Grading report model and output sinks
//!
//! The pipeline hands each finished [`ReportEntry`] to a [`ReportSink`] as soon
//! as it is known, in submission order, so a sink can write incrementally and
//! an interrupted run still leaves a readable partial report behind.

mod text;

use std::path::PathBuf;

use serde::Serialize;

use crate::chunk::Chunk;
use crate::collect::SkippedDocument;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::index::Neighbor;
use crate::rubric::{Rubric, ScoreResult};

pub use text::{TextReportFile, TextReportWriter};

/// Where the run's index came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOrigin {
    #[default]
    Built,
    Loaded,
}

/// What the run loaded, skipped and produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub reference_documents: usize,
    pub submission_documents: usize,
    pub skipped: Vec<SkippedDocument>,
    /// Submission roots that did not exist
    pub missing_roots: Vec<PathBuf>,
    pub reference_chunks: usize,
    pub submission_chunks: usize,
    pub index: IndexOrigin,
}

/// Truncated view of a submitted chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPreview {
    pub source: String,
    pub ordinal: usize,
    pub text: String,
}

/// Truncated view of a reference neighbor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborPreview {
    pub id: usize,
    pub similarity: f32,
    pub source: String,
    pub ordinal: usize,
    pub text: String,
}

/// One scored submission chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Zero-based position in submission order
    pub position: usize,
    pub chunk: ChunkPreview,
    pub score: ScoreResult,
    /// Feedback sentence for each failed criterion, in rubric order
    pub feedback: Vec<String>,
    /// Contextual neighbors, most similar first
    pub neighbors: Vec<NeighborPreview>,
}

impl ReportEntry {
    pub fn new(
        position: usize,
        chunk: &Chunk,
        score: ScoreResult,
        neighbors: &[Neighbor<'_>],
        rubric: &Rubric,
        config: &ReportConfig,
    ) -> Self {
        let feedback = score
            .failed
            .iter()
            .map(|label| rubric.feedback_for(label).to_string())
            .collect();

        Self {
            position,
            chunk: ChunkPreview {
                source: chunk.source.clone(),
                ordinal: chunk.ordinal,
                text: truncate_chars(&chunk.text, config.chunk_preview).to_string(),
            },
            score,
            feedback,
            neighbors: neighbors
                .iter()
                .map(|n| NeighborPreview {
                    id: n.id,
                    similarity: n.similarity,
                    source: n.chunk.source.clone(),
                    ordinal: n.chunk.ordinal,
                    text: truncate_chars(&n.chunk.text, config.neighbor_preview).to_string(),
                })
                .collect(),
        }
    }
}

/// Full result of a grading run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    /// Floor of the mean chunk score, 0 when nothing was scored
    pub aggregate: u32,
    /// Set when the run was cancelled before every chunk was scored
    pub partial: bool,
    pub summary: RunSummary,
}

impl Report {
    pub fn new(entries: Vec<ReportEntry>, partial: bool, summary: RunSummary) -> Self {
        let aggregate = aggregate(entries.iter().map(|e| e.score.score));
        Self {
            entries,
            aggregate,
            partial,
            summary,
        }
    }
}

/// Floor of the mean score; 0 for no scores
pub fn aggregate(scores: impl IntoIterator<Item = u32>) -> u32 {
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), s| (sum + u64::from(s), count + 1));
    if count == 0 {
        0
    } else {
        // Every score is at most 100, so the mean fits
        (sum / count) as u32
    }
}

/// At most `max_chars` leading characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Receives report pieces as the pipeline produces them
pub trait ReportSink {
    /// Called once loading succeeded, before the first entry
    fn begin(&mut self, summary: &RunSummary) -> Result<()>;

    fn entry(&mut self, entry: &ReportEntry) -> Result<()>;

    /// Called once with the assembled report, partial or not
    fn finish(&mut self, report: &Report) -> Result<()>;
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn begin(&mut self, _summary: &RunSummary) -> Result<()> {
        Ok(())
    }

    fn entry(&mut self, _entry: &ReportEntry) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self, _report: &Report) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RubricConfig;
    use crate::document::Origin;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            ordinal: 2,
            origin: Origin::Student,
            source: "src/App.jsx".to_string(),
            text: text.to_string(),
            overlap: 0,
            offset: 0,
        }
    }

    #[test]
    fn test_aggregate_is_floor_of_mean() {
        assert_eq!(aggregate([85, 60]), 72);
        assert_eq!(aggregate([100, 100, 99]), 99);
        assert_eq!(aggregate([0]), 0);
    }

    #[test]
    fn test_aggregate_of_nothing_is_zero() {
        assert_eq!(aggregate(std::iter::empty()), 0);
        let report = Report::new(Vec::new(), false, RunSummary::default());
        assert_eq!(report.aggregate, 0);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_entry_uses_feedback_sentences_and_previews() {
        let rubric = Rubric::from_config(&RubricConfig::default()).unwrap();
        let submitted = chunk("function App() { return <TodoList />; }");
        let reference = Chunk {
            origin: Origin::Instructor,
            ..chunk("export default function App() {}")
        };
        let score = rubric.score(0, &submitted.text);
        let neighbors = vec![Neighbor {
            id: 4,
            similarity: 0.5,
            chunk: &reference,
        }];
        let config = ReportConfig {
            chunk_preview: 8,
            neighbor_preview: 6,
        };

        let entry = ReportEntry::new(0, &submitted, score, &neighbors, &rubric, &config);

        assert_eq!(entry.chunk.text, "function");
        assert_eq!(entry.chunk.ordinal, 2);
        assert_eq!(entry.neighbors[0].text, "export");
        assert_eq!(entry.neighbors[0].id, 4);
        assert_eq!(
            entry.feedback,
            vec![
                "Header or Footer not used properly.",
                "PropTypes or helper functions missing.",
                "Missing export statement.",
            ]
        );
    }
}
