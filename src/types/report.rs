use std::fmt;
use std::time::Duration;

use super::calculated::ComputedWrite;
use crate::formula::FormulaEvaluationError;

/// Detailed outcome of one recomputation pass, returned by
/// [`Recomputer::recompute_detailed()`](crate::Recomputer::recompute_detailed).
///
/// Contains the proposed writes, the formulas that failed (and were skipped),
/// every target evaluated in order, and the wall-clock duration of the pass.
#[derive(Debug, Clone)]
#[must_use]
pub struct RecomputeReport {
    writes: Vec<ComputedWrite>,
    failures: Vec<FormulaEvaluationError>,
    evaluated: Vec<String>,
    duration: Duration,
}

impl RecomputeReport {
    pub(crate) fn new(
        writes: Vec<ComputedWrite>,
        failures: Vec<FormulaEvaluationError>,
        evaluated: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            writes,
            failures,
            evaluated,
            duration,
        }
    }

    /// Writes proposed by the pass; only targets whose value changed.
    #[must_use]
    pub fn writes(&self) -> &[ComputedWrite] {
        &self.writes
    }

    #[must_use]
    pub fn into_writes(self) -> Vec<ComputedWrite> {
        self.writes
    }

    /// Formula failures, one per skipped target.
    #[must_use]
    pub fn failures(&self) -> &[FormulaEvaluationError] {
        &self.failures
    }

    /// All targets in the order they were evaluated.
    #[must_use]
    pub fn evaluated(&self) -> &[String] {
        &self.evaluated
    }

    /// Wall-clock duration of the pass.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether every scheduled formula evaluated without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for RecomputeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let writes: Vec<String> = self.writes.iter().map(ToString::to_string).collect();
        write!(f, "writes: [{}]", writes.join(", "))?;
        write!(f, ", failures: {}", self.failures.len())?;
        write!(f, ", evaluated: [{}]", self.evaluated.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
