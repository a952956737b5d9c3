//! Grading pipeline
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Loading -> Chunking -> IndexReady -> Scoring -> Aggregating -> Done
//! ```
//!
//! Loading degrades gracefully: missing submission roots and unreadable files
//! are logged and recorded in the [`RunSummary`]. Everything structural (no
//! documents at all, no usable index, dimension disagreement) aborts the run
//! before the report sink sees anything.
//!
//! Scoring is sequential with one worker, or fans out over a bounded rayon
//! pool in batches. Either way entries reach the sink in submission order, and
//! the [`CancelToken`] is checked between chunks or batches.

mod stage;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::chunk::{Chunk, Chunker};
use crate::collect::collect_documents;
use crate::config::GradeConfig;
use crate::document::{Origin, SourceDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::{GradeError, Result};
use crate::index::{Trust, VectorIndex};
use crate::report::{IndexOrigin, Report, ReportEntry, ReportSink, RunSummary};
use crate::rubric::Rubric;
use crate::trace_time;

pub use stage::{CancelToken, Stage};

/// Chunks scored per parallel batch, per worker
const BATCH_PER_WORKER: usize = 8;

/// How the run obtains its reference index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    /// Collect and chunk the reference tree, embed it, optionally save it
    Build {
        reference_root: PathBuf,
        save_to: Option<PathBuf>,
    },
    /// Load a persisted index
    Load { path: PathBuf, trust: Trust },
}

/// Inputs of one grading run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineInput {
    pub submission_roots: Vec<PathBuf>,
    pub index: IndexSource,
}

/// Everything the scoring stage needs, produced by [`Pipeline::prepare`]
#[derive(Debug)]
pub struct Prepared {
    pub index: VectorIndex,
    /// Submission chunks in document order, then ordinal order
    pub chunks: Vec<Chunk>,
    pub summary: RunSummary,
    stage: Stage,
}

/// Configured grading pipeline. Reusable across runs.
pub struct Pipeline {
    config: GradeConfig,
    rubric: Rubric,
    chunker: Chunker,
    provider: Arc<dyn EmbeddingProvider>,
    cancel: CancelToken,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("rubric", &self.rubric)
            .field("chunker", &self.chunker)
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Validate the configuration and assemble the pipeline.
    ///
    /// Fails with `Configuration` before any I/O when the rubric or chunk
    /// settings are invalid.
    pub fn new(config: GradeConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        config.validate()?;
        let rubric = Rubric::from_config(&config.rubric)?;
        let chunker = Chunker::from_config(&config.chunking)?;
        Ok(Self {
            config,
            rubric,
            chunker,
            provider,
            cancel: CancelToken::new(),
        })
    }

    /// Use `token` for cooperative cancellation
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn config(&self) -> &GradeConfig {
        &self.config
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Run every stage and return the report.
    ///
    /// A cancelled run still returns `Ok` with `partial` set; the caller
    /// decides how to surface the interruption.
    #[tracing::instrument(skip_all, fields(roots = input.submission_roots.len()))]
    pub fn run(&self, input: &PipelineInput, sink: &mut dyn ReportSink) -> Result<Report> {
        let mut prepared = self.prepare(input)?;

        sink.begin(&prepared.summary)?;
        prepared.stage.advance(Stage::Scoring)?;
        let start = Instant::now();
        let mut entries = Vec::with_capacity(prepared.chunks.len());
        let scored = self.score_chunks(&prepared.index, &prepared.chunks, sink, &mut entries);
        let partial = match scored {
            Ok(complete) => !complete,
            Err(err) => {
                let report = Report::new(entries, true, prepared.summary);
                if let Err(finish_err) = sink.finish(&report) {
                    tracing::warn!(error = %finish_err, "could not finish partial report");
                }
                return Err(err);
            }
        };
        trace_time!(start, "scoring", entries = entries.len());
        if partial {
            tracing::warn!(
                scored = entries.len(),
                total = prepared.chunks.len(),
                "run cancelled, report is partial"
            );
        }

        prepared.stage.advance(Stage::Aggregating)?;
        let report = Report::new(entries, partial, prepared.summary);

        prepared.stage.advance(Stage::Done)?;
        sink.finish(&report)?;
        tracing::info!(
            aggregate = report.aggregate,
            entries = report.entries.len(),
            partial = report.partial,
            "grading finished"
        );
        Ok(report)
    }

    /// Run the loading, chunking and index stages
    pub fn prepare(&self, input: &PipelineInput) -> Result<Prepared> {
        let mut stage = Stage::Loading;
        let mut summary = RunSummary::default();

        let submissions = self.load_submissions(&input.submission_roots, &mut summary)?;
        let references = match &input.index {
            IndexSource::Build { reference_root, .. } => {
                Some(self.load_references(reference_root, &mut summary)?)
            }
            IndexSource::Load { .. } => None,
        };

        stage.advance(Stage::Chunking)?;
        let chunks = self.chunk_all(&submissions);
        summary.submission_chunks = chunks.len();
        let reference_chunks = references.as_deref().map(|docs| self.chunk_all(docs));

        let index = match (&input.index, reference_chunks) {
            (IndexSource::Build { save_to, .. }, Some(reference_chunks)) => {
                let index = self.index_chunks(reference_chunks)?;
                if let Some(dir) = save_to {
                    index.save(dir)?;
                }
                summary.index = IndexOrigin::Built;
                index
            }
            (IndexSource::Load { path, trust }, _) => {
                let index = self.load_index(path, *trust)?;
                summary.index = IndexOrigin::Loaded;
                summary.reference_documents = distinct_sources(&index);
                index
            }
            (IndexSource::Build { .. }, None) => {
                return Err(GradeError::IndexUnavailable {
                    reason: "reference documents were not loaded".to_string(),
                })
            }
        };
        summary.reference_chunks = index.len();
        stage.advance(Stage::IndexReady)?;

        tracing::info!(
            submission_documents = summary.submission_documents,
            submission_chunks = summary.submission_chunks,
            reference_chunks = summary.reference_chunks,
            skipped = summary.skipped.len(),
            "inputs ready"
        );

        Ok(Prepared {
            index,
            chunks,
            summary,
            stage,
        })
    }

    /// Collect, chunk and embed a reference tree.
    ///
    /// Fails with `SourceNotFound` when the tree holds no readable documents
    /// and `IndexUnavailable` when they produce no chunks.
    pub fn build_index(&self, reference_root: &Path, summary: &mut RunSummary) -> Result<VectorIndex> {
        let documents = self.load_references(reference_root, summary)?;
        let index = self.index_chunks(self.chunk_all(&documents))?;
        summary.reference_chunks = index.len();
        summary.index = IndexOrigin::Built;
        Ok(index)
    }

    /// Split documents in order into one chunk sequence
    pub fn chunk_all(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.chunker.chunk_document(doc))
            .collect()
    }

    fn load_submissions(
        &self,
        roots: &[PathBuf],
        summary: &mut RunSummary,
    ) -> Result<Vec<SourceDocument>> {
        let Some(first_root) = roots.first() else {
            return Err(GradeError::UsageError(
                "at least one submission directory is required".to_string(),
            ));
        };

        let mut documents = Vec::new();
        for root in roots {
            match collect_documents(root, Origin::Student, &self.config.collection) {
                Ok(collected) => {
                    documents.extend(collected.documents);
                    summary.skipped.extend(collected.skipped);
                }
                Err(GradeError::SourceNotFound { root }) => {
                    tracing::warn!(root = %root.display(), "submission directory not found");
                    summary.missing_roots.push(root);
                }
                Err(e) => return Err(e),
            }
        }

        if documents.is_empty() {
            let root = summary
                .missing_roots
                .first()
                .unwrap_or(first_root)
                .clone();
            return Err(GradeError::SourceNotFound { root });
        }
        summary.submission_documents = documents.len();
        Ok(documents)
    }

    fn load_references(
        &self,
        root: &Path,
        summary: &mut RunSummary,
    ) -> Result<Vec<SourceDocument>> {
        let collected = collect_documents(root, Origin::Instructor, &self.config.collection)?;
        summary.skipped.extend(collected.skipped);
        if collected.documents.is_empty() {
            tracing::error!(root = %root.display(), "no readable reference documents");
            return Err(GradeError::SourceNotFound {
                root: root.to_path_buf(),
            });
        }
        summary.reference_documents = collected.documents.len();
        Ok(collected.documents)
    }

    fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<VectorIndex> {
        if chunks.is_empty() {
            return Err(GradeError::IndexUnavailable {
                reason: "reference documents produced no chunks".to_string(),
            });
        }
        let start = Instant::now();
        let index = VectorIndex::embed_and_build(self.provider.as_ref(), chunks)?;
        trace_time!(start, "embed_reference", entries = index.len());
        Ok(index)
    }

    fn load_index(&self, path: &Path, trust: Trust) -> Result<VectorIndex> {
        let index = VectorIndex::load(path, trust)?;
        if !index.is_empty() && index.dimension() != self.provider.dimension() {
            return Err(GradeError::dimension_mismatch(
                "loaded index dimension",
                self.provider.dimension(),
                index.dimension(),
            ));
        }
        if let Some(built_with) = index.provider() {
            if built_with != self.provider.name() {
                tracing::warn!(
                    index_provider = built_with,
                    provider = self.provider.name(),
                    "index was built with a different embedding provider"
                );
            }
        }
        Ok(index)
    }

    fn score_chunk(&self, index: &VectorIndex, position: usize, chunk: &Chunk) -> Result<ReportEntry> {
        let neighbors = index.query_text(
            self.provider.as_ref(),
            &chunk.text,
            self.config.retrieval.neighbor_count,
        )?;
        let score = self.rubric.score(position, &chunk.text);
        Ok(ReportEntry::new(
            position,
            chunk,
            score,
            &neighbors,
            &self.rubric,
            &self.config.report,
        ))
    }

    /// Score chunks in order, pushing each entry to `sink` and `entries`.
    /// Returns `false` when cancellation cut the run short. On error `entries`
    /// holds everything scored before the failure.
    fn score_chunks(
        &self,
        index: &VectorIndex,
        chunks: &[Chunk],
        sink: &mut dyn ReportSink,
        entries: &mut Vec<ReportEntry>,
    ) -> Result<bool> {
        let workers = self.config.pipeline.workers;

        if workers <= 1 {
            for (position, chunk) in chunks.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    return Ok(false);
                }
                let entry = self.score_chunk(index, position, chunk)?;
                sink.entry(&entry)?;
                entries.push(entry);
            }
            return Ok(true);
        }

        if self.provider.order_dependent() {
            tracing::warn!(
                provider = self.provider.name(),
                workers,
                "provider output depends on call order; neighbors will vary between parallel runs"
            );
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| GradeError::Other(format!("failed to start scoring workers: {}", e)))?;
        let batch_size = workers * BATCH_PER_WORKER;

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }
            let base = batch_no * batch_size;
            let results: Vec<Result<ReportEntry>> = pool.install(|| {
                use rayon::prelude::*;
                batch
                    .par_iter()
                    .enumerate()
                    .map(|(i, chunk)| self.score_chunk(index, base + i, chunk))
                    .collect()
            });
            for result in results {
                let entry = result?;
                sink.entry(&entry)?;
                entries.push(entry);
            }
        }
        Ok(true)
    }
}

fn distinct_sources(index: &VectorIndex) -> usize {
    index
        .entries()
        .iter()
        .map(|e| e.chunk.source.as_str())
        .collect::<HashSet<_>>()
        .len()
}
