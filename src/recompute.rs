//! Reactive recomputation of calculated fields.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use crate::formula::FormulaEvaluationError;
use crate::graph::affected_calculations;
use crate::{CompiledSchema, ComputedWrite, FieldValues, RecomputeReport};

/// Recomputes calculated fields when the paths they depend on change.
///
/// A pass walks the calculated fields in evaluation order. Each formula sees
/// the snapshot overlaid with the values computed earlier in the same pass,
/// so chained fields (tax over a calculated subtotal) settle in one pass. A
/// write is proposed only when the new value differs from the current one,
/// which makes a pass idempotent: re-running it over its own output proposes
/// nothing. Failing formulas are logged and skipped; the pass carries on.
///
/// Writes are tagged [`WriteOrigin::System`](crate::WriteOrigin::System).
/// Hosts should apply them without marking fields dirty and without
/// triggering another pass.
#[derive(Debug, Clone, Copy)]
pub struct Recomputer<'s> {
    schema: &'s CompiledSchema,
}

impl<'s> Recomputer<'s> {
    #[must_use]
    pub fn new(schema: &'s CompiledSchema) -> Self {
        Self { schema }
    }

    /// Paths whose changes trigger a pass.
    #[must_use]
    pub fn watched_paths(&self) -> &'s BTreeSet<String> {
        self.schema.watched_paths()
    }

    /// Whether a change at `path` can affect a calculated field.
    ///
    /// A change to a parent object (`address`) counts for a watched child
    /// (`address.zip`) and vice versa.
    #[must_use]
    pub fn is_watched(&self, path: &str) -> bool {
        self.schema
            .watched_paths()
            .iter()
            .any(|watched| overlaps(watched, path))
    }

    /// Full pass if any of `changed_paths` is watched; no writes otherwise.
    pub fn on_change<I, S>(&self, changed_paths: I, snapshot: &FieldValues) -> Vec<ComputedWrite>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if changed_paths
            .into_iter()
            .any(|path| self.is_watched(path.as_ref()))
        {
            self.recompute(snapshot)
        } else {
            Vec::new()
        }
    }

    /// Unconditional full pass.
    pub fn recompute(&self, snapshot: &FieldValues) -> Vec<ComputedWrite> {
        self.pass(snapshot, None).into_writes()
    }

    /// Pass restricted to the calculated fields affected by `changed_path`,
    /// still in evaluation order.
    ///
    /// Paths overlap the same way as in [`is_watched`](Self::is_watched), so
    /// replacing `address` reaches formulas reading `address.zip`.
    pub fn recompute_affected(&self, changed_path: &str, snapshot: &FieldValues) -> Vec<ComputedWrite> {
        let mut affected = affected_calculations(changed_path, &self.schema.calculated);
        for watched in self.schema.watched_paths() {
            if watched != changed_path && overlaps(watched, changed_path) {
                affected.extend(affected_calculations(watched, &self.schema.calculated));
            }
        }
        if affected.is_empty() {
            return Vec::new();
        }
        self.pass(snapshot, Some(&affected)).into_writes()
    }

    /// Full pass with failures, evaluation order and timing.
    pub fn recompute_detailed(&self, snapshot: &FieldValues) -> RecomputeReport {
        self.pass(snapshot, None)
    }

    fn pass(&self, snapshot: &FieldValues, only: Option<&HashSet<String>>) -> RecomputeReport {
        let start = Instant::now();
        tracing::trace!(
            calculated = self.schema.calculated.len(),
            restricted = only.is_some(),
            "recompute pass"
        );

        let mut overlay = snapshot.clone();
        let mut writes = Vec::new();
        let mut failures = Vec::new();
        let mut evaluated = Vec::new();

        for (spec, formula) in self.schema.calculated.iter().zip(&self.schema.formulas) {
            if only.is_some_and(|set| !set.contains(&spec.target)) {
                continue;
            }
            evaluated.push(spec.target.clone());

            let result = match formula {
                Ok(formula) => formula.evaluate(&overlay),
                Err(error) => Err(error.clone()),
            };

            match result {
                Ok(value) => {
                    let unchanged = overlay
                        .get(&spec.target)
                        .is_some_and(|current| current.strict_eq(&value));
                    if unchanged {
                        continue;
                    }
                    tracing::debug!(field = %spec.target, %value, "calculated value changed");
                    overlay.insert(&spec.target, value.clone());
                    writes.push(ComputedWrite::system(spec.target.clone(), value));
                }
                Err(source) => {
                    tracing::warn!(
                        field = %spec.target,
                        error = %source,
                        "formula evaluation failed; write skipped"
                    );
                    failures.push(FormulaEvaluationError {
                        target: spec.target.clone(),
                        source,
                    });
                }
            }
        }

        RecomputeReport::new(writes, failures, evaluated, start.elapsed())
    }
}

/// Equal paths, or one is a dot-separated prefix of the other.
fn overlaps(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long.strip_prefix(short)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
