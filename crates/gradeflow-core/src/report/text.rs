//! Plain-text feedback report

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{IndexOrigin, Report, ReportEntry, ReportSink, RunSummary};
use crate::error::Result;

const RULE: &str = "==============================";

/// Writes the human-readable report to any `Write`
#[derive(Debug)]
pub struct TextReportWriter<W: Write> {
    out: W,
}

impl<W: Write> TextReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_summary(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(self.out, "Run summary:")?;
        writeln!(
            self.out,
            "- Reference: {} documents, {} chunks (index {})",
            summary.reference_documents,
            summary.reference_chunks,
            match summary.index {
                IndexOrigin::Built => "built",
                IndexOrigin::Loaded => "loaded",
            }
        )?;
        writeln!(
            self.out,
            "- Submission: {} documents, {} chunks",
            summary.submission_documents, summary.submission_chunks
        )?;
        for root in &summary.missing_roots {
            writeln!(self.out, "- Missing root: {}", root.display())?;
        }
        for skipped in &summary.skipped {
            writeln!(
                self.out,
                "- Skipped {}: {}",
                skipped.path.display(),
                skipped.reason
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

impl<W: Write> ReportSink for TextReportWriter<W> {
    fn begin(&mut self, _summary: &RunSummary) -> Result<()> {
        writeln!(self.out, "===== Submission Feedback =====")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn entry(&mut self, entry: &ReportEntry) -> Result<()> {
        writeln!(self.out, "{}", RULE)?;
        writeln!(
            self.out,
            "Chunk #{} ({}, part {})",
            entry.position + 1,
            entry.chunk.source,
            entry.chunk.ordinal + 1
        )?;
        writeln!(self.out, "{}", RULE)?;
        writeln!(self.out, "{}", entry.chunk.text)?;
        writeln!(self.out)?;

        writeln!(self.out, "Score for this chunk: {}", entry.score.score)?;
        writeln!(self.out, "Feedback:")?;
        if entry.feedback.is_empty() {
            writeln!(self.out, "- All criteria satisfied.")?;
        } else {
            for item in &entry.feedback {
                writeln!(self.out, "- {}", item)?;
            }
        }

        writeln!(self.out)?;
        writeln!(self.out, "Closest reference chunk (preview):")?;
        match entry.neighbors.first() {
            Some(neighbor) => {
                writeln!(
                    self.out,
                    "[{}, part {}, similarity {:.3}]",
                    neighbor.source,
                    neighbor.ordinal + 1,
                    neighbor.similarity
                )?;
                writeln!(self.out, "{}", neighbor.text)?;
            }
            None => writeln!(self.out, "(none)")?,
        }
        writeln!(self.out)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self, report: &Report) -> Result<()> {
        self.write_summary(&report.summary)?;
        writeln!(self.out, "{}", RULE)?;
        if report.partial {
            writeln!(
                self.out,
                "Final Project Score: {}/100 (partial: {} of {} chunks scored)",
                report.aggregate,
                report.entries.len(),
                report.summary.submission_chunks
            )?;
        } else {
            writeln!(self.out, "Final Project Score: {}/100", report.aggregate)?;
        }
        writeln!(self.out, "{}", RULE)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Text report written to a file that is only created once the run has
/// loaded its inputs, so a run that fails early leaves no file behind
#[derive(Debug)]
pub struct TextReportFile {
    path: PathBuf,
    writer: Option<TextReportWriter<BufWriter<File>>>,
}

impl TextReportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the file has been created
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn writer(&mut self) -> Result<&mut TextReportWriter<BufWriter<File>>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => TextReportWriter::new(BufWriter::new(File::create(&self.path)?)),
        };
        Ok(self.writer.insert(writer))
    }
}

impl ReportSink for TextReportFile {
    fn begin(&mut self, summary: &RunSummary) -> Result<()> {
        self.writer()?.begin(summary)
    }

    fn entry(&mut self, entry: &ReportEntry) -> Result<()> {
        self.writer()?.entry(entry)
    }

    fn finish(&mut self, report: &Report) -> Result<()> {
        self.writer()?.finish(report)
    }
}
