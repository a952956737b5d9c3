//! Configuration type definitions

use serde::{Deserialize, Serialize};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "gradeflow.toml";

/// Top-level grading configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeConfig {
    /// Text segmentation settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Nearest-neighbor context settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding provider selection
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Document collection filters
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Report preview sizes
    #[serde(default)]
    pub report: ReportConfig,

    /// Scoring concurrency
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Weighted grading criteria
    #[serde(default)]
    pub rubric: RubricConfig,
}

/// Chunker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Characters repeated from the previous chunk
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Separators tried coarsest first; the empty string splits between characters
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
}

/// Retrieval configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Reference neighbors fetched per submitted chunk
    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: usize,
}

/// Which embedding provider to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Deterministic token-hashing vectors
    #[default]
    Hashed,
    /// Non-semantic uniform random vectors (placeholder)
    Random,
}

/// Embedding provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// Vector dimension produced by the provider
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Seed for the random provider (unseeded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Apply Porter stemming before hashing tokens
    #[serde(default = "default_stem")]
    pub stem: bool,
}

/// File collection filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Accepted file extensions, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names never descended into
    #[serde(default = "default_ignored_directories")]
    pub ignored_directories: Vec<String>,

    /// File names always skipped
    #[serde(default = "default_ignored_files")]
    pub ignored_files: Vec<String>,
}

/// Report rendering configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Characters of each submitted chunk shown in the report
    #[serde(default = "default_chunk_preview")]
    pub chunk_preview: usize,

    /// Characters of each reference neighbor shown in the report
    #[serde(default = "default_neighbor_preview")]
    pub neighbor_preview: usize,
}

/// Pipeline execution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scoring workers; 1 scores sequentially
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Ordered rubric criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricConfig {
    #[serde(default = "default_criteria")]
    pub criteria: Vec<CriterionConfig>,
}

/// A single weighted criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub label: String,

    /// Share of the 100 available points
    pub weight: u32,

    /// Sentence shown to the student when the criterion is not met
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    pub detector: DetectorConfig,
}

/// Text pattern a criterion looks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorConfig {
    /// Text contains the substring
    Contains(String),
    /// Text contains at least one of the substrings
    AnyOf(Vec<String>),
    /// Text contains every substring
    AllOf(Vec<String>),
    /// Text matches the regular expression
    Regex(String),
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            overlap: default_overlap(),
            separators: default_separators(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            neighbor_count: default_neighbor_count(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            dimension: default_dimension(),
            seed: None,
            stem: default_stem(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignored_directories: default_ignored_directories(),
            ignored_files: default_ignored_files(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            chunk_preview: default_chunk_preview(),
            neighbor_preview: default_neighbor_preview(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for RubricConfig {
    fn default() -> Self {
        Self {
            criteria: default_criteria(),
        }
    }
}

fn default_max_size() -> usize {
    300
}

fn default_overlap() -> usize {
    50
}

fn default_separators() -> Vec<String> {
    ["\n\n", "\n", " ", ""]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_neighbor_count() -> usize {
    3
}

fn default_dimension() -> usize {
    768
}

fn default_stem() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["js".to_string(), "jsx".to_string()]
}

fn default_ignored_directories() -> Vec<String> {
    ["node_modules", ".git", "__pycache__"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_ignored_files() -> Vec<String> {
    ["package-lock.json", "package.json", "eslint.config.js"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_chunk_preview() -> usize {
    500
}

fn default_neighbor_preview() -> usize {
    300
}

fn default_workers() -> usize {
    1
}

fn criterion(label: &str, weight: u32, feedback: &str, detector: DetectorConfig) -> CriterionConfig {
    CriterionConfig {
        label: label.to_string(),
        weight,
        feedback: Some(feedback.to_string()),
        detector,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_criteria() -> Vec<CriterionConfig> {
    vec![
        criterion(
            "App component implemented",
            25,
            "Missing App component.",
            DetectorConfig::AnyOf(strings(&["function App", "const App"])),
        ),
        criterion(
            "Header/Footer implemented",
            20,
            "Header or Footer not used properly.",
            DetectorConfig::AllOf(strings(&["Header", "Footer"])),
        ),
        criterion(
            "TodoList functionality",
            30,
            "TodoList functionality missing.",
            DetectorConfig::Contains("TodoList".to_string()),
        ),
        criterion(
            "PropTypes and helpers",
            15,
            "PropTypes or helper functions missing.",
            DetectorConfig::AnyOf(strings(&["PropTypes", "formatMessage"])),
        ),
        criterion(
            "Code style / exports",
            10,
            "Missing export statement.",
            DetectorConfig::Contains("export".to_string()),
        ),
    ]
}
