//! Error types and exit codes for gradeflow
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage or configuration error (bad flags, invalid rubric, bad chunk sizes)
//! - 3: Data error (missing sources, unreadable or corrupt index)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage or configuration error (2)
    Usage = 2,
    /// Data error - missing sources, corrupt index (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during a grading run
#[derive(Error, Debug)]
pub enum GradeError {
    // Usage / configuration errors (exit code 2)
    #[error("{0}")]
    UsageError(String),

    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    // Data errors (exit code 3)
    #[error("no documents found under {root:?}")]
    SourceNotFound { root: PathBuf },

    #[error("could not read document {path:?}: {reason}")]
    DocumentRead { path: PathBuf, reason: String },

    #[error("failed to load index from {path:?}: {reason}")]
    IndexLoad { path: PathBuf, reason: String },

    #[error("no index available: {reason}")]
    IndexUnavailable { reason: String },

    // Generic failures (exit code 1)
    #[error("{context} mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid embedding: {reason}")]
    InvalidEmbedding { reason: String },

    #[error("embedding provider {provider} failed: {reason}")]
    Embedding { provider: String, reason: String },

    #[error("illegal pipeline transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),

    #[error("Grading interrupted. A partial report was written.")]
    Interrupted,
}

impl GradeError {
    /// Create a configuration error
    pub fn config(reason: impl std::fmt::Display) -> Self {
        GradeError::Configuration {
            reason: reason.to_string(),
        }
    }

    /// Create an error for an index that could not be loaded
    pub fn index_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        GradeError::IndexLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(context: &str, expected: usize, found: usize) -> Self {
        GradeError::DimensionMismatch {
            context: context.to_string(),
            expected,
            found,
        }
    }

    /// Create an error for a failed embedding provider call
    pub fn embedding(provider: &str, reason: impl std::fmt::Display) -> Self {
        GradeError::Embedding {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            GradeError::UsageError(_) | GradeError::Configuration { .. } => ExitCode::Usage,

            GradeError::SourceNotFound { .. }
            | GradeError::DocumentRead { .. }
            | GradeError::IndexLoad { .. }
            | GradeError::IndexUnavailable { .. } => ExitCode::Data,

            GradeError::DimensionMismatch { .. }
            | GradeError::InvalidEmbedding { .. }
            | GradeError::Embedding { .. }
            | GradeError::InvalidTransition { .. }
            | GradeError::Io(_)
            | GradeError::Json(_)
            | GradeError::Toml(_)
            | GradeError::Other(_)
            | GradeError::Interrupted => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            GradeError::UsageError(_) => "usage_error",
            GradeError::Configuration { .. } => "configuration_error",
            GradeError::SourceNotFound { .. } => "source_not_found",
            GradeError::DocumentRead { .. } => "document_read_error",
            GradeError::IndexLoad { .. } => "index_load_error",
            GradeError::IndexUnavailable { .. } => "index_unavailable",
            GradeError::DimensionMismatch { .. } => "dimension_mismatch",
            GradeError::InvalidEmbedding { .. } => "invalid_embedding",
            GradeError::Embedding { .. } => "embedding_error",
            GradeError::InvalidTransition { .. } => "invalid_transition",
            GradeError::Io(_) => "io_error",
            GradeError::Json(_) => "json_error",
            GradeError::Toml(_) => "toml_error",
            GradeError::Other(_) => "other",
            GradeError::Interrupted => "interrupted",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for gradeflow operations
pub type Result<T> = std::result::Result<T, GradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_taxonomy() {
        assert_eq!(GradeError::config("bad").exit_code(), ExitCode::Usage);
        assert_eq!(
            GradeError::SourceNotFound {
                root: PathBuf::from("missing")
            }
            .exit_code(),
            ExitCode::Data
        );
        assert_eq!(
            GradeError::index_load("idx", "missing").exit_code(),
            ExitCode::Data
        );
        assert_eq!(
            GradeError::dimension_mismatch("vector dimension", 4, 3).exit_code(),
            ExitCode::Failure
        );
        assert_eq!(GradeError::Interrupted.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = GradeError::dimension_mismatch("vector dimension", 768, 512);
        assert_eq!(
            err.to_string(),
            "vector dimension mismatch: expected 768, found 512"
        );
    }

    #[test]
    fn test_to_json_envelope() {
        let err = GradeError::config("overlap must be smaller than max_size");
        let json = err.to_json();
        assert_eq!(json["error"]["code"], 2);
        assert_eq!(json["error"]["type"], "configuration_error");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("overlap must be smaller"));
    }
}
