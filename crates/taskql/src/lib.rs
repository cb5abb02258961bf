//! Query language engine for task collections.
//!
//! This crate turns a human-typed filter/sort/group expression into a
//! [`ParsedQuery`](query::ParsedQuery) and runs it over a slice of [`Task`]s,
//! consulting a [`DependencyGraph`] for the blocking shortcuts.
//!
//! Everything here is synchronous and side-effect free: tasks and the graph
//! are borrowed for the duration of a call and never retained.

pub mod graph;
pub mod query;
mod task;

pub use graph::{DependencyGraph, NoDependencies, TaskGraph};
pub use task::{Priority, Task, TaskStatus};
