//! Query language lexer, parser and evaluator for task collections.
//!
//! A query is an optional filter expression followed by optional `sort by`
//! and `group by` clauses:
//!
//! ```text
//! not done AND (is blocked OR tag includes #urgent) sort by priority desc group by status
//! ```
//!
//! # Supported Syntax
//!
//! ## Comparisons
//! - `field is value`, `field is not value` - Case-insensitive equality, list membership
//! - `field includes value`, `field not includes value` - Substring or list membership
//! - `field before date`, `field after date` - Date comparison (`today`, `tomorrow`,
//!   `yesterday` or `YYYY-MM-DD`)
//! - `field matches pattern`, `field not matches pattern` - Regular expression,
//!   optionally with flags as a quoted `"/pattern/flags"` (`matches "/^buy/i"`).
//!   An unquoted `/` is skipped by the lexer.
//!
//! Field names may be aliases (`tag`, `text`, `file`, ...) or dotted paths into
//! custom properties (`meta.owner`).
//!
//! ## Dependency Shortcuts
//! - `is blocked`, `is not blocked`
//! - `is blocking`, `is not blocking`
//! - `depends on X`, `blocks X`
//!
//! ## Status Words
//! - `todo`, `in-progress`, `done`, `cancelled` - Shorthand for `status is <word>`
//!
//! ## Boolean Operators
//! - `AND`, `OR`, `NOT` (case-insensitive)
//! - `()` - Grouping
//!
//! ## Clauses
//! - `sort by field [asc|desc], ...` - Stable multi-key sort
//! - `group by field` - Partition results, fanning out list fields
//!
//! # Example
//!
//! ```
//! use taskql::query::QueryEngine;
//! use taskql::{Task, TaskGraph};
//!
//! let mut report = Task::new("1", "Write report");
//! report.tags = vec!["#work".to_string(), "#urgent".to_string()];
//! let tasks = vec![report, Task::new("2", "Water plants")];
//!
//! let engine = QueryEngine::default();
//! let query = engine.parse("tag includes #work group by tag");
//! let graph = TaskGraph::from_tasks(&tasks);
//!
//! let groups = engine.execute_grouped(&query, &tasks, &graph);
//! assert_eq!(groups.labels().collect::<Vec<_>>(), vec!["#work", "#urgent"]);
//! ```

mod ast;
mod engine;
mod error;
mod evaluator;
mod lexer;
mod order;
mod parser;
mod resolver;
mod vocabulary;

pub use ast::{
    DependencyCheck, GroupKey, LogicalOp, Operator, ParsedQuery, QueryNode, SortDirection, SortKey,
};
pub use engine::QueryEngine;
pub use error::{QueryError, QueryResult};
pub use evaluator::QueryEvaluator;
pub use lexer::{
    tokenize, Connective, Keyword, Lexer, LexerError, LexerResult, Relation, Token, TokenKind,
};
pub use order::{group_tasks, sort_tasks, TaskGroup, TaskGroups, ALL_LABEL, NONE_LABEL};
pub use parser::{ParseOutcome, QueryParser};
pub use resolver::{FieldResolver, FieldValue};
pub use vocabulary::{Vocabulary, BUILTIN_FIELDS, PRIORITY_FIELD, STATUS_FIELD};
