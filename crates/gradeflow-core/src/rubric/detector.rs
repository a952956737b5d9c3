//! Pluggable text predicates used by rubric criteria

use regex::Regex;

use crate::config::DetectorConfig;
use crate::error::{GradeError, Result};

/// Boolean predicate over chunk text.
///
/// Implement this to replace substring checks with structural ones
/// (for example a syntax-tree query) without touching the scorer.
pub trait Detector: Send + Sync {
    fn matches(&self, text: &str) -> bool;

    /// Short human-readable description for logs and debug output
    fn describe(&self) -> String;
}

/// Substring and regular-expression detectors built from configuration
#[derive(Debug, Clone)]
pub enum PatternDetector {
    Contains(String),
    AnyOf(Vec<String>),
    AllOf(Vec<String>),
    Regex(Regex),
}

impl PatternDetector {
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        let detector = match config {
            DetectorConfig::Contains(pattern) => PatternDetector::Contains(pattern.clone()),
            DetectorConfig::AnyOf(patterns) | DetectorConfig::AllOf(patterns)
                if patterns.is_empty() =>
            {
                return Err(GradeError::config("detector pattern list must not be empty"));
            }
            DetectorConfig::AnyOf(patterns) => PatternDetector::AnyOf(patterns.clone()),
            DetectorConfig::AllOf(patterns) => PatternDetector::AllOf(patterns.clone()),
            DetectorConfig::Regex(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| {
                    GradeError::config(format!("invalid detector regex '{}': {}", pattern, e))
                })?;
                PatternDetector::Regex(regex)
            }
        };
        Ok(detector)
    }
}

impl Detector for PatternDetector {
    fn matches(&self, text: &str) -> bool {
        match self {
            PatternDetector::Contains(pattern) => text.contains(pattern.as_str()),
            PatternDetector::AnyOf(patterns) => patterns.iter().any(|p| text.contains(p.as_str())),
            PatternDetector::AllOf(patterns) => patterns.iter().all(|p| text.contains(p.as_str())),
            PatternDetector::Regex(regex) => regex.is_match(text),
        }
    }

    fn describe(&self) -> String {
        match self {
            PatternDetector::Contains(pattern) => format!("contains {:?}", pattern),
            PatternDetector::AnyOf(patterns) => format!("any of {:?}", patterns),
            PatternDetector::AllOf(patterns) => format!("all of {:?}", patterns),
            PatternDetector::Regex(regex) => format!("matches /{}/", regex.as_str()),
        }
    }
}
