//! Dependency graph interface and a task-backed implementation.
//!
//! The query engine only consumes [`DependencyGraph`]. [`TaskGraph`] is a
//! straightforward implementation built from `depends_on` references, for
//! hosts that have no graph of their own.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::task::Task;

/// Read-only view of task dependencies, keyed by task id.
pub trait DependencyGraph {
    /// Returns true if the task waits on at least one incomplete task.
    fn is_blocked(&self, id: &str) -> bool;

    /// Returns true if an incomplete task waits on this one.
    fn is_blocking(&self, id: &str) -> bool;

    /// Returns the ids of tasks that depend on `id`, directly or transitively.
    fn dependents(&self, id: &str, transitive: bool) -> HashSet<String>;

    /// Maps a user-supplied reference to the id used by this graph.
    fn resolve_id(&self, reference: &str) -> String {
        reference.to_string()
    }
}

/// A graph with no edges: nothing is blocked and nothing blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependencyGraph for NoDependencies {
    fn is_blocked(&self, _id: &str) -> bool {
        false
    }

    fn is_blocking(&self, _id: &str) -> bool {
        false
    }

    fn dependents(&self, _id: &str, _transitive: bool) -> HashSet<String> {
        HashSet::new()
    }
}

/// Dependency graph derived from a slice of tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Task id -> completion state.
    complete: HashMap<String, bool>,
    /// `dependency_id` -> task id.
    references: HashMap<String, String>,
    /// Task id -> ids of the tasks it depends on.
    dependencies: HashMap<String, Vec<String>>,
    /// Task id -> ids of the tasks that depend on it.
    dependents: HashMap<String, Vec<String>>,
}

impl TaskGraph {
    /// Builds the graph. References that match no task are ignored.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = Self::default();

        for task in tasks {
            graph
                .complete
                .insert(task.id.clone(), task.is_complete());
            if let Some(reference) = &task.dependency_id {
                graph
                    .references
                    .insert(reference.clone(), task.id.clone());
            }
        }

        for task in tasks {
            for reference in &task.depends_on {
                let Some(target) = graph.lookup(reference) else {
                    continue;
                };
                if target == task.id {
                    continue;
                }
                graph
                    .dependencies
                    .entry(task.id.clone())
                    .or_default()
                    .push(target.clone());
                graph
                    .dependents
                    .entry(target)
                    .or_default()
                    .push(task.id.clone());
            }
        }

        graph
    }

    /// Resolves a reference by `dependency_id` first, then by task id.
    fn lookup(&self, reference: &str) -> Option<String> {
        if let Some(id) = self.references.get(reference) {
            return Some(id.clone());
        }
        self.complete
            .contains_key(reference)
            .then(|| reference.to_string())
    }

    fn is_incomplete(&self, id: &str) -> bool {
        self.complete.get(id).is_some_and(|complete| !complete)
    }
}

impl DependencyGraph for TaskGraph {
    fn is_blocked(&self, id: &str) -> bool {
        self.dependencies
            .get(id)
            .is_some_and(|deps| deps.iter().any(|dep| self.is_incomplete(dep)))
    }

    fn is_blocking(&self, id: &str) -> bool {
        self.is_incomplete(id)
            && self
                .dependents
                .get(id)
                .is_some_and(|deps| deps.iter().any(|dep| self.is_incomplete(dep)))
    }

    fn dependents(&self, id: &str, transitive: bool) -> HashSet<String> {
        let mut found = HashSet::new();
        let mut queue = VecDeque::from([id.to_string()]);

        while let Some(current) = queue.pop_front() {
            let Some(direct) = self.dependents.get(&current) else {
                continue;
            };
            for dependent in direct {
                if found.insert(dependent.clone()) && transitive {
                    queue.push_back(dependent.clone());
                }
            }
        }

        found.remove(id);
        found
    }

    fn resolve_id(&self, reference: &str) -> String {
        self.lookup(reference)
            .unwrap_or_else(|| reference.to_string())
    }
}
