//! Dependency graph utilities for calculated fields.
//!
//! All functions here are pure and usable on their own, e.g. for linting a
//! schema before it is loaded.

use std::collections::{HashMap, HashSet};

use crate::types::{CalculatedField, CycleError, MissingDependency};

/// Calculated-field targets mapped to the paths their formulas declare as inputs.
///
/// A dependency that is not itself a target is a plain input field: a leaf of
/// the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    /// Declared dependencies of `target`, or `None` if it is not a calculated field.
    #[must_use]
    pub fn dependencies_of(&self, target: &str) -> Option<&HashSet<String>> {
        self.edges.get(target)
    }

    /// Whether `path` is a calculated-field target.
    #[must_use]
    pub fn is_calculated(&self, path: &str) -> bool {
        self.edges.contains_key(path)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Build the target → dependencies graph. Repeated targets merge their dependencies.
#[must_use]
pub fn build_dependency_graph(specs: &[CalculatedField]) -> DependencyGraph {
    let mut edges: HashMap<String, HashSet<String>> = HashMap::new();
    for spec in specs {
        edges
            .entry(spec.target.clone())
            .or_default()
            .extend(spec.depends_on.iter().cloned());
    }
    DependencyGraph { edges }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    Unvisited,
    InStack,
    Done,
}

/// Order calculated fields so each appears after every calculated field it
/// depends on, directly or transitively.
///
/// Depth-first over the specs in input order; dependencies are visited in
/// declaration order, so the result is deterministic. When a target is declared
/// more than once, the last declaration is used and appears once.
///
/// # Errors
///
/// Returns [`CycleError`] if the calculated fields depend on each other in a loop.
pub fn evaluation_order(specs: &[CalculatedField]) -> Result<Vec<&CalculatedField>, CycleError> {
    let by_target: HashMap<&str, &CalculatedField> =
        specs.iter().map(|s| (s.target.as_str(), s)).collect();

    let mut state: HashMap<&str, DfsState> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut order: Vec<&CalculatedField> = Vec::with_capacity(by_target.len());

    for spec in specs {
        visit(
            spec.target.as_str(),
            &by_target,
            &mut state,
            &mut stack,
            &mut order,
        )?;
    }

    Ok(order)
}

fn visit<'a>(
    target: &'a str,
    by_target: &HashMap<&'a str, &'a CalculatedField>,
    state: &mut HashMap<&'a str, DfsState>,
    stack: &mut Vec<&'a str>,
    order: &mut Vec<&'a CalculatedField>,
) -> Result<(), CycleError> {
    match state.get(target).copied().unwrap_or(DfsState::Unvisited) {
        DfsState::Done => return Ok(()),
        DfsState::InStack => {
            let pos = stack.iter().position(|&n| n == target).unwrap_or(0);
            let mut path: Vec<String> = stack[pos..].iter().map(|&s| s.to_owned()).collect();
            path.push(target.to_owned());
            return Err(CycleError {
                target: target.to_owned(),
                path,
            });
        }
        DfsState::Unvisited => {}
    }

    let Some(&spec) = by_target.get(target) else {
        return Ok(());
    };

    state.insert(target, DfsState::InStack);
    stack.push(target);

    for dep in &spec.depends_on {
        if by_target.contains_key(dep.as_str()) {
            visit(dep.as_str(), by_target, state, stack, order)?;
        }
    }

    stack.pop();
    state.insert(target, DfsState::Done);
    order.push(spec);
    Ok(())
}

/// Calculated targets that must be recomputed after `changed_field` changes:
/// the fixed point of "depends on the changed field or on an affected target".
#[must_use]
pub fn affected_calculations(changed_field: &str, specs: &[CalculatedField]) -> HashSet<String> {
    let mut affected: HashSet<String> = HashSet::new();
    loop {
        let mut grew = false;
        for spec in specs {
            if affected.contains(&spec.target) {
                continue;
            }
            if spec
                .depends_on
                .iter()
                .any(|dep| dep == changed_field || affected.contains(dep))
            {
                affected.insert(spec.target.clone());
                grew = true;
            }
        }
        if !grew {
            return affected;
        }
    }
}

/// One warning per `dependsOn` entry that is not among `known_paths`.
#[must_use]
pub fn validate_dependencies<I, S>(specs: &[CalculatedField], known_paths: I) -> Vec<MissingDependency>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let known: HashSet<String> = known_paths
        .into_iter()
        .map(|p| p.as_ref().to_owned())
        .collect();
    let known = &known;

    specs
        .iter()
        .flat_map(move |spec| {
            spec.depends_on
                .iter()
                .filter(move |dep| !known.contains(dep.as_str()))
                .map(move |dep| MissingDependency {
                    target: spec.target.clone(),
                    dependency: dep.clone(),
                })
        })
        .collect()
}
