//! Rubric scoring
//!
//! A rubric is an ordered list of weighted criteria whose weights sum to 100.
//! Each criterion owns a [`Detector`], a boolean predicate over chunk text.
//! Scoring a chunk adds up the weights of every satisfied criterion and
//! records the labels of the failed ones in rubric order.

mod detector;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bail_config;
use crate::config::RubricConfig;
use crate::error::Result;

pub use detector::{Detector, PatternDetector};

/// Total points a rubric distributes
pub const TOTAL_WEIGHT: u32 = 100;

/// A labelled, weighted grading check
pub struct Criterion {
    label: String,
    weight: u32,
    feedback: Option<String>,
    detector: Box<dyn Detector>,
}

impl Criterion {
    pub fn new(label: impl Into<String>, weight: u32, detector: Box<dyn Detector>) -> Self {
        Self {
            label: label.into(),
            weight,
            feedback: None,
            detector,
        }
    }

    /// Attach the sentence shown when this criterion fails
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn is_satisfied_by(&self, text: &str) -> bool {
        self.detector.matches(text)
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criterion")
            .field("label", &self.label)
            .field("weight", &self.weight)
            .field("detector", &self.detector.describe())
            .finish()
    }
}

/// Outcome of scoring one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Position of the chunk in the scored sequence
    pub chunk_id: usize,
    /// Sum of satisfied weights, 0..=100
    pub score: u32,
    /// Labels of unmet criteria, in rubric order
    pub failed: Vec<String>,
}

impl ScoreResult {
    /// True when every criterion was satisfied
    pub fn is_perfect(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Validated, ordered set of criteria
#[derive(Debug)]
pub struct Rubric {
    criteria: Vec<Criterion>,
}

impl Rubric {
    /// Build a rubric, enforcing weights in `1..=100` that sum to exactly 100
    /// and unique, non-empty labels.
    pub fn new(criteria: Vec<Criterion>) -> Result<Self> {
        if criteria.is_empty() {
            bail_config!("rubric must contain at least one criterion");
        }

        let mut labels = HashSet::new();
        for criterion in &criteria {
            if criterion.label.trim().is_empty() {
                bail_config!("rubric criterion labels must not be empty");
            }
            if !labels.insert(criterion.label.as_str()) {
                bail_config!("duplicate rubric criterion label: {}", criterion.label);
            }
            if criterion.weight == 0 || criterion.weight > TOTAL_WEIGHT {
                bail_config!(
                    "weight of criterion '{}' must be between 1 and {}, got {}",
                    criterion.label,
                    TOTAL_WEIGHT,
                    criterion.weight
                );
            }
        }

        let total: u32 = criteria.iter().map(|c| c.weight).sum();
        if total != TOTAL_WEIGHT {
            bail_config!(
                "rubric weights must sum to {}, got {}",
                TOTAL_WEIGHT,
                total
            );
        }

        Ok(Self { criteria })
    }

    /// Compile the configured criteria into a rubric
    pub fn from_config(config: &RubricConfig) -> Result<Self> {
        let criteria = config
            .criteria
            .iter()
            .map(|c| {
                let detector = PatternDetector::from_config(&c.detector)?;
                let criterion = Criterion::new(c.label.clone(), c.weight, Box::new(detector));
                Ok(match &c.feedback {
                    Some(feedback) => criterion.with_feedback(feedback.clone()),
                    None => criterion,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(criteria)
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Look up a criterion by label
    pub fn criterion(&self, label: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.label == label)
    }

    /// Score a chunk against every criterion. Detectors see the full text.
    pub fn score(&self, chunk_id: usize, text: &str) -> ScoreResult {
        let mut score = 0;
        let mut failed = Vec::new();

        for criterion in &self.criteria {
            if criterion.is_satisfied_by(text) {
                score += criterion.weight;
            } else {
                failed.push(criterion.label.clone());
            }
        }

        ScoreResult {
            chunk_id,
            score,
            failed,
        }
    }

    /// Feedback sentence for a failed label, falling back to the label itself
    pub fn feedback_for<'a>(&'a self, label: &'a str) -> &'a str {
        self.criterion(label)
            .and_then(Criterion::feedback)
            .unwrap_or(label)
    }
}

#[cfg(test)]
mod tests;
