//! Dependency ordering for tools and environments.
//!
//! Depth-first traversal with three markers per node:
//!
//! 1. unvisited: not reached yet
//! 2. in-progress: on the current traversal stack
//! 3. done: emitted to the output
//!
//! Reaching an in-progress node means the graph has a cycle. Nodes are emitted
//! in post-order, so every dependency precedes its dependents. Iteration
//! follows the input order and each item's declared dependency order, which
//! makes the output deterministic.

use std::collections::{HashMap, HashSet};

use crate::domain::error::DependencyError;
use crate::domain::installable::Installable;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Per-call traversal state. Discarded when resolution returns.
struct Graph<'a, T> {
    by_name: HashMap<&'a str, &'a T>,
    marks: HashMap<&'a str, Mark>,
    order: Vec<&'a T>,
}

impl<'a, T: Installable> Graph<'a, T> {
    fn new(items: &'a [T]) -> Self {
        let mut by_name = HashMap::with_capacity(items.len());
        for item in items {
            by_name.entry(item.name()).or_insert(item);
        }
        Self {
            by_name,
            marks: HashMap::with_capacity(items.len()),
            order: Vec::with_capacity(items.len()),
        }
    }

    fn visit(&mut self, item: &'a T) -> Result<(), DependencyError> {
        let name = item.name();
        match self.marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(DependencyError::Cycle {
                    name: name.to_string(),
                });
            }
            None => {}
        }
        self.marks.insert(name, Mark::InProgress);
        for dep in item.dependencies() {
            let Some(&dep_item) = self.by_name.get(dep.as_str()) else {
                return Err(DependencyError::Missing {
                    dependency: dep.clone(),
                    requester: name.to_string(),
                });
            };
            self.visit(dep_item)?;
        }
        self.marks.insert(name, Mark::Done);
        self.order.push(item);
        Ok(())
    }
}

/// Order `items` so that every item comes after all of its dependencies.
///
/// Fails on the first cycle or missing dependency encountered; no partial
/// order is returned. When two items share a name the first one wins.
///
/// # Errors
///
/// Returns [`DependencyError::Cycle`] naming a node on the cycle, or
/// [`DependencyError::Missing`] naming the absent dependency and its requester.
pub fn resolve<T: Installable>(items: &[T]) -> Result<Vec<&T>, DependencyError> {
    let mut graph = Graph::new(items);
    for item in items {
        if graph.by_name.get(item.name()).is_some_and(|first| !std::ptr::eq(*first, item)) {
            continue;
        }
        graph.visit(item)?;
    }
    Ok(graph.order)
}

/// Report every dependency problem in `items` without ordering them.
///
/// Collects duplicate names, every missing dependency (in input order) and
/// one [`DependencyError::Cycle`] per cycle found by a full traversal.
///
/// # Errors
///
/// Returns all problems found; `Ok(())` means [`resolve`] will succeed.
pub fn validate_dependencies<T: Installable>(items: &[T]) -> Result<(), Vec<DependencyError>> {
    let mut problems = Vec::new();
    let mut names = HashSet::with_capacity(items.len());
    for item in items {
        if !names.insert(item.name()) {
            problems.push(DependencyError::Duplicate {
                name: item.name().to_string(),
            });
        }
    }
    for item in items {
        for dep in item.dependencies() {
            if !names.contains(dep.as_str()) {
                problems.push(DependencyError::Missing {
                    dependency: dep.clone(),
                    requester: item.name().to_string(),
                });
            }
        }
    }
    problems.extend(find_cycles(items));
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Full traversal that skips missing names and records the node that closes
/// each cycle instead of stopping at the first one.
fn find_cycles<T: Installable>(items: &[T]) -> Vec<DependencyError> {
    fn walk<'a, T: Installable>(
        item: &'a T,
        by_name: &HashMap<&'a str, &'a T>,
        marks: &mut HashMap<&'a str, Mark>,
        cycles: &mut Vec<DependencyError>,
    ) {
        marks.insert(item.name(), Mark::InProgress);
        for dep in item.dependencies() {
            let Some(&dep_item) = by_name.get(dep.as_str()) else {
                continue;
            };
            match marks.get(dep_item.name()) {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => cycles.push(DependencyError::Cycle {
                    name: dep_item.name().to_string(),
                }),
                None => walk(dep_item, by_name, marks, cycles),
            }
        }
        marks.insert(item.name(), Mark::Done);
    }

    let mut by_name = HashMap::with_capacity(items.len());
    for item in items {
        by_name.entry(item.name()).or_insert(item);
    }
    let mut marks = HashMap::with_capacity(items.len());
    let mut cycles = Vec::new();
    for item in items {
        if !marks.contains_key(item.name()) {
            walk(item, &by_name, &mut marks, &mut cycles);
        }
    }
    cycles
}
