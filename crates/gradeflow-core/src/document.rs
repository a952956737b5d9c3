//! Source documents loaded from the reference and submission trees

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which side of the grading run a document or chunk belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Reference (instructor) solution
    Instructor,
    /// Submitted (student) code
    Student,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Instructor => write!(f, "instructor"),
            Origin::Student => write!(f, "student"),
        }
    }
}

/// Raw text of one file plus where it came from. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    origin: Origin,
    source: String,
    path: PathBuf,
    text: String,
}

impl SourceDocument {
    /// Create a document. `source` is the label shown in reports, usually the
    /// path relative to the collection root.
    pub fn new(
        origin: Origin,
        source: impl Into<String>,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            source: source.into(),
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
