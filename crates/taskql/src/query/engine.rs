//! Parse-and-run facade over the query pipeline.

use chrono::NaiveDate;
use tracing::debug;

use super::ast::ParsedQuery;
use super::error::QueryResult;
use super::evaluator::QueryEvaluator;
use super::order::{group_tasks, sort_tasks, TaskGroups, ALL_LABEL};
use super::parser::{ParseOutcome, QueryParser};
use super::resolver::FieldResolver;
use super::vocabulary::Vocabulary;
use crate::graph::DependencyGraph;
use crate::task::Task;

/// Runs queries against task collections.
///
/// The engine holds no state between calls besides its vocabulary and an
/// optional fixed `today`, so one engine can serve any number of queries.
///
/// # Example
///
/// ```
/// use taskql::query::QueryEngine;
/// use taskql::{NoDependencies, Task, TaskStatus};
///
/// let mut done = Task::new("1", "Ship it");
/// done.status = TaskStatus::Done;
/// let tasks = vec![done, Task::new("2", "Write docs")];
///
/// let engine = QueryEngine::default();
/// let query = engine.parse("not done");
/// let results = engine.execute(&query, &tasks, &NoDependencies);
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].id, "2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    vocabulary: Vocabulary,
    today: Option<NaiveDate>,
}

impl QueryEngine {
    /// Creates an engine with the given vocabulary.
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            today: None,
        }
    }

    /// Pins the date `today` refers to. By default it is the local date at
    /// the start of each execution.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Parses query text leniently.
    pub fn parse(&self, input: &str) -> ParsedQuery {
        QueryParser::parse_with(input, &self.vocabulary)
    }

    /// Parses query text and returns everything that was forgiven.
    pub fn parse_with_diagnostics(&self, input: &str) -> ParseOutcome {
        QueryParser::parse_with_diagnostics(input, &self.vocabulary)
    }

    /// Parses query text, rejecting anything lenient parsing would forgive.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in the query.
    pub fn parse_strict(&self, input: &str) -> QueryResult<ParsedQuery> {
        QueryParser::parse_strict(input, &self.vocabulary)
    }

    /// Filters and sorts tasks. Input order is kept when there are no sort
    /// keys.
    pub fn execute<'t>(
        &self,
        query: &ParsedQuery,
        tasks: &'t [Task],
        graph: &dyn DependencyGraph,
    ) -> Vec<&'t Task> {
        let mut evaluator = QueryEvaluator::new(query.filter.as_ref(), graph, &self.vocabulary);
        if let Some(today) = self.today {
            evaluator = evaluator.with_today(today);
        }

        let mut matched = evaluator.filter_tasks(tasks);
        sort_tasks(&mut matched, &query.sort, &FieldResolver::new(&self.vocabulary));

        debug!(
            total = tasks.len(),
            matched = matched.len(),
            sort_keys = query.sort.len(),
            "executed query"
        );
        matched
    }

    /// Filters, sorts and groups tasks.
    ///
    /// Without a group clause the result is a single `"all"` bucket holding
    /// the whole sorted result.
    pub fn execute_grouped<'t>(
        &self,
        query: &ParsedQuery,
        tasks: &'t [Task],
        graph: &dyn DependencyGraph,
    ) -> TaskGroups<'t> {
        let matched = self.execute(query, tasks, graph);

        let Some(group) = &query.group else {
            return TaskGroups::single(ALL_LABEL, matched);
        };

        let groups = group_tasks(&matched, &group.field, &FieldResolver::new(&self.vocabulary));
        debug!(field = %group.field, buckets = groups.len(), "grouped results");
        groups
    }
}
