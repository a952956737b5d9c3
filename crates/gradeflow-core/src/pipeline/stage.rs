//! Run stages and cooperative cancellation

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{GradeError, Result};

/// Stage of a grading run. Transitions only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Loading,
    Chunking,
    IndexReady,
    Scoring,
    Aggregating,
    Done,
}

impl Stage {
    /// The stage that follows this one, `None` after `Done`
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Loading => Some(Stage::Chunking),
            Stage::Chunking => Some(Stage::IndexReady),
            Stage::IndexReady => Some(Stage::Scoring),
            Stage::Scoring => Some(Stage::Aggregating),
            Stage::Aggregating => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    /// Move to `to`, which must be the immediate successor
    pub fn advance(&mut self, to: Stage) -> Result<()> {
        if self.next() != Some(to) {
            return Err(GradeError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        tracing::debug!(from = %self, to = %to, "stage transition");
        *self = to;
        Ok(())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading => "loading",
            Stage::Chunking => "chunking",
            Stage::IndexReady => "index_ready",
            Stage::Scoring => "scoring",
            Stage::Aggregating => "aggregating",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Shared flag checked between scoring steps. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
