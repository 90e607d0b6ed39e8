use std::fmt;

use chrono::{DateTime, Utc};

use crate::errors::{DocumentError, ExtractError, GenerationError, RewriteError};

/// Terminal state of one document transaction.
#[derive(Debug)]
pub enum Outcome {
    Saved,
    Skipped(SkipReason),
    Failed(FailReason),
}

/// Deliberate no-ops. These never affect the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyTrace,
    NoReasoningCell,
    DryRun,
}

#[derive(Debug)]
pub enum FailReason {
    Document(DocumentError),
    Extraction(ExtractError),
    Generation(GenerationError),
    Rewrite(RewriteError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyTrace => write!(f, "no tool actions"),
            SkipReason::NoReasoningCell => write!(f, "no reasoning cell"),
            SkipReason::DryRun => write!(f, "dry run"),
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::Document(e) => write!(f, "{}", e),
            FailReason::Extraction(e) => write!(f, "{}", e),
            FailReason::Generation(e) => write!(f, "{}", e),
            FailReason::Rewrite(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Saved => write!(f, "rewritten"),
            Outcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            Outcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Aggregate counts over one run, for the operator summary line.
pub struct RunSummary {
    pub rewritten: usize,
    pub skipped: usize,
    pub failed: usize,
    started_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            rewritten: 0,
            skipped: 0,
            failed: 0,
            started_at: Utc::now(),
        }
    }

    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Saved => self.rewritten += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn any_failed(&self) -> bool {
        self.failed > 0
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = (Utc::now() - self.started_at).num_seconds();
        write!(
            f,
            "{} rewritten, {} skipped, {} failed in {}s",
            self.rewritten, self.skipped, self.failed, elapsed
        )
    }
}
