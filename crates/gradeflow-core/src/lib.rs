//! gradeflow core library
//!
//! Chunking, vector indexing, retrieval and rubric scoring for grading
//! submitted source code against a reference solution.
//!
//! The usual entry point is [`pipeline::Pipeline`]: build it from a validated
//! [`config::GradeConfig`] and an [`embedding::EmbeddingProvider`], then run it
//! with a [`report::ReportSink`].

pub mod chunk;
pub mod collect;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod rubric;
pub mod text;
