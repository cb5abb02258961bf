//! Filter evaluation against tasks.
//!
//! This module provides the [`QueryEvaluator`] for evaluating a parsed filter
//! against tasks, using the field resolver for comparisons and the dependency
//! graph for the blocking shortcuts.
//!
//! # Example
//!
//! ```
//! use taskql::query::{QueryEvaluator, QueryParser, Vocabulary};
//! use taskql::{NoDependencies, Task};
//!
//! let query = QueryParser::parse("status is todo");
//! let vocabulary = Vocabulary::default();
//! let evaluator = QueryEvaluator::new(query.filter.as_ref(), &NoDependencies, &vocabulary);
//!
//! let task = Task::new("t1", "Buy milk");
//! assert!(evaluator.matches(&task));
//! ```

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::ast::{DependencyCheck, LogicalOp, Operator, QueryNode};
use super::error::QueryError;
use super::resolver::{FieldResolver, FieldValue};
use super::vocabulary::Vocabulary;
use crate::graph::DependencyGraph;
use crate::task::Task;

/// Upper bound on the compiled size of a single `matches` pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Evaluates a parsed filter against tasks.
///
/// Patterns used by `matches` are compiled once, when the evaluator is built.
/// `today` is captured at the same moment so every task in one run sees the
/// same date.
pub struct QueryEvaluator<'a> {
    filter: Option<&'a QueryNode>,
    graph: &'a dyn DependencyGraph,
    resolver: FieldResolver<'a>,
    today: NaiveDate,
    patterns: HashMap<String, Result<Regex, String>>,
}

impl<'a> QueryEvaluator<'a> {
    /// Creates a new evaluator. `None` matches every task.
    pub fn new(
        filter: Option<&'a QueryNode>,
        graph: &'a dyn DependencyGraph,
        vocabulary: &'a Vocabulary,
    ) -> Self {
        let mut patterns = HashMap::new();
        if let Some(node) = filter {
            node.for_each_comparison(&mut |_, operator, value| {
                if matches!(operator, Operator::Matches | Operator::NotMatches)
                    && !patterns.contains_key(value)
                {
                    patterns.insert(value.to_string(), compile_pattern(value));
                }
            });
        }

        Self {
            filter,
            graph,
            resolver: FieldResolver::new(vocabulary),
            today: Local::now().date_naive(),
            patterns,
        }
    }

    /// Overrides the date that `today` refers to.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Returns the date `today` resolves to.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Patterns in the filter that failed to compile.
    pub fn pattern_errors(&self) -> Vec<QueryError> {
        let mut errors: Vec<QueryError> = self
            .patterns
            .iter()
            .filter_map(|(pattern, compiled)| {
                compiled
                    .as_ref()
                    .err()
                    .map(|reason| QueryError::invalid_pattern(pattern, reason))
            })
            .collect();
        errors.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        errors
    }

    /// Returns true if the task matches the filter.
    pub fn matches(&self, task: &Task) -> bool {
        self.filter.map_or(true, |node| self.evaluate(node, task))
    }

    /// Filters a slice of tasks, keeping input order.
    pub fn filter_tasks<'t>(&self, tasks: &'t [Task]) -> Vec<&'t Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }

    /// Evaluates one node against a task.
    pub fn evaluate(&self, node: &QueryNode, task: &Task) -> bool {
        match node {
            QueryNode::Comparison {
                field,
                operator,
                value,
            } => self.compare(task, field, *operator, value),
            QueryNode::Logical {
                op: LogicalOp::And,
                left,
                right,
            } => self.evaluate(left, task) && self.evaluate(right, task),
            QueryNode::Logical {
                op: LogicalOp::Or,
                left,
                right,
            } => self.evaluate(left, task) || self.evaluate(right, task),
            QueryNode::Not { operand } => !self.evaluate(operand, task),
            QueryNode::Dependency { check } => self.check_dependency(task, check),
        }
    }

    /// Answers a dependency shortcut from the graph.
    fn check_dependency(&self, task: &Task, check: &DependencyCheck) -> bool {
        match check {
            DependencyCheck::Blocked => self.graph.is_blocked(&task.id),
            DependencyCheck::NotBlocked => !self.graph.is_blocked(&task.id),
            DependencyCheck::Blocking => self.graph.is_blocking(&task.id),
            DependencyCheck::DependsOn(target) => {
                let target = self.graph.resolve_id(target);
                self.graph.dependents(&target, false).contains(&task.id)
            }
            DependencyCheck::Blocks(target) => {
                let target = self.graph.resolve_id(target);
                self.graph.dependents(&task.id, false).contains(&target)
            }
        }
    }

    /// Evaluates `field operator value` for a task.
    fn compare(&self, task: &Task, field: &str, operator: Operator, value: &str) -> bool {
        if matches!(operator, Operator::Matches | Operator::NotMatches) {
            return self.compare_pattern(task, field, operator, value);
        }

        let actual = self.resolver.resolve(task, field);
        let (positive, negated) = operator.split_negation();
        let result = match positive {
            Operator::Is => self.is_equal(field, &actual, value),
            Operator::Includes => includes(&actual, value),
            Operator::Before => self
                .date_pair(&actual, value)
                .is_some_and(|(actual, expected)| actual < expected),
            Operator::After => self
                .date_pair(&actual, value)
                .is_some_and(|(actual, expected)| actual > expected),
            // Negated forms were split off above.
            Operator::IsNot
            | Operator::NotIncludes
            | Operator::Matches
            | Operator::NotMatches => false,
        };

        result != negated
    }

    /// `matches` / `not matches`. An invalid pattern is false either way.
    fn compare_pattern(&self, task: &Task, field: &str, operator: Operator, pattern: &str) -> bool {
        // Nodes passed to `evaluate` from outside the filter are compiled on demand.
        let on_demand;
        let compiled = match self.patterns.get(pattern) {
            Some(compiled) => compiled,
            None => {
                on_demand = compile_pattern(pattern);
                &on_demand
            }
        };
        let Ok(regex) = compiled else {
            return false;
        };

        let text = self.resolver.resolve(task, field).to_text();
        regex.is_match(&text) == (operator == Operator::Matches)
    }

    /// Case-insensitive equality, membership for lists, dates for date fields.
    fn is_equal(&self, field: &str, actual: &FieldValue, expected: &str) -> bool {
        let canonical = self.resolver.canonical(field);
        if self.resolver.vocabulary().is_date_field(&canonical) {
            if let Some((actual, expected)) = self.date_pair(actual, expected) {
                return actual == expected;
            }
        }

        let expected = expected.to_lowercase();
        match actual {
            FieldValue::Missing => false,
            FieldValue::Text(text) => text.to_lowercase() == expected,
            FieldValue::List(items) => items.iter().any(|item| item.to_lowercase() == expected),
        }
    }

    /// Parses both sides of a date comparison.
    fn date_pair(&self, actual: &FieldValue, expected: &str) -> Option<(NaiveDate, NaiveDate)> {
        let FieldValue::Text(text) = actual else {
            return None;
        };
        Some((parse_date(text)?, self.resolve_date(expected)?))
    }

    /// Resolves a date literal or a relative date word.
    fn resolve_date(&self, literal: &str) -> Option<NaiveDate> {
        match literal.to_lowercase().as_str() {
            "today" => Some(self.today),
            "tomorrow" => self.today.succ_opt(),
            "yesterday" => self.today.pred_opt(),
            _ => parse_date(literal),
        }
    }
}

/// Substring for text, membership for lists, case-insensitive.
fn includes(actual: &FieldValue, expected: &str) -> bool {
    let expected = expected.to_lowercase();
    match actual {
        FieldValue::Missing => false,
        FieldValue::Text(text) => text.to_lowercase().contains(&expected),
        FieldValue::List(items) => items.iter().any(|item| item.to_lowercase() == expected),
    }
}

/// Parses the date part of `YYYY-MM-DD[THH:MM[:SS]]`.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let date = text.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Compiles a pattern, logging it when it is rejected.
fn compile_pattern(raw: &str) -> Result<Regex, String> {
    build_pattern(raw).inspect_err(|reason| {
        warn!(pattern = raw, error = %reason, "invalid pattern, predicate evaluates to false");
    })
}

/// Compiles `pattern` or `/pattern/flags` under a compiled size limit.
pub(crate) fn build_pattern(raw: &str) -> Result<Regex, String> {
    let (pattern, flags) = match raw.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
        Some((pattern, flags)) => (pattern, flags),
        None => (raw, ""),
    };

    let mut builder = RegexBuilder::new(pattern);
    builder.size_limit(PATTERN_SIZE_LIMIT);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            other => return Err(format!("unsupported flag '{other}'")),
        }
    }

    builder.build().map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
