//! Output formatting utilities for the tq CLI.
//!
//! - [`tasks`] - Query results as tables or JSON, flat or grouped
//! - [`explain`] - Token streams and parse trees
//! - [`helpers`] - Common formatting utilities (truncation, priority, due dates)

mod explain;
pub mod helpers;
mod tasks;

pub use explain::{format_explain_json, format_explain_text, ExplainReport};
pub use tasks::{format_groups_json, format_groups_table, format_tasks_json, format_tasks_table};
