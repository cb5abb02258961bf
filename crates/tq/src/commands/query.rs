//! Query command implementation.
//!
//! Runs a query over the loaded task file and prints the matches, grouped
//! when the query has a `group by` clause.

use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;
use taskql::query::{ParsedQuery, QueryEngine, QueryError, TaskGroup};
use taskql::{Task, TaskGraph};

use super::config::Config;
use super::{CommandContext, Result};
use crate::output::{format_groups_json, format_groups_table, format_tasks_json, format_tasks_table};

/// Options for the query command.
#[derive(Debug)]
pub struct QueryOptions<'a> {
    /// Query text, or a saved query name when `saved` is set.
    pub query: &'a str,
    /// Look the query up in the config's saved queries.
    pub saved: bool,
    /// Reject queries that need repair.
    pub strict: bool,
    /// Maximum tasks shown, per group when grouping.
    pub limit: Option<usize>,
    /// Override for the current date.
    pub today: Option<NaiveDate>,
}

/// A parsed query ready to run, with whatever the parser had to forgive.
struct PreparedQuery {
    engine: QueryEngine,
    query: ParsedQuery,
    diagnostics: Vec<QueryError>,
    today: NaiveDate,
}

/// Executes the query command.
///
/// # Errors
///
/// Returns an error if a saved query is unknown, if strict parsing rejects
/// the query, or if JSON serialization fails.
pub fn execute(
    ctx: &CommandContext,
    opts: &QueryOptions<'_>,
    config: &Config,
    tasks: &[Task],
) -> Result<()> {
    let prepared = prepare(opts, config)?;

    if !ctx.json_output && !ctx.quiet {
        for diagnostic in &prepared.diagnostics {
            let message = format!("warning: {diagnostic}");
            if ctx.use_colors {
                eprintln!("{}", message.yellow());
            } else {
                eprintln!("{message}");
            }
        }
    }

    let use_colors = ctx.use_colors && config.color_enabled();
    let output = render(&prepared, opts.limit, tasks, ctx.json_output, use_colors)?;

    if ctx.json_output {
        println!("{output}");
    } else if !ctx.quiet {
        print!("{output}");
    }

    Ok(())
}

/// Resolves and parses the query text.
fn prepare(opts: &QueryOptions<'_>, config: &Config) -> Result<PreparedQuery> {
    let text = config.resolve_query(opts.query, opts.saved)?;
    let today = opts.today.unwrap_or_else(|| Local::now().date_naive());
    let engine = QueryEngine::new(config.vocabulary()).with_today(today);

    let (query, diagnostics) = if opts.strict {
        (engine.parse_strict(text)?, Vec::new())
    } else {
        let outcome = engine.parse_with_diagnostics(text);
        (outcome.query, outcome.diagnostics)
    };

    Ok(PreparedQuery {
        engine,
        query,
        diagnostics,
        today,
    })
}

/// Runs the query and formats the result.
fn render(
    prepared: &PreparedQuery,
    limit: Option<usize>,
    tasks: &[Task],
    json: bool,
    use_colors: bool,
) -> Result<String> {
    let graph = TaskGraph::from_tasks(tasks);
    let normalized = prepared.query.to_string();

    if prepared.query.group.is_some() {
        let groups: Vec<TaskGroup<'_>> = prepared
            .engine
            .execute_grouped(&prepared.query, tasks, &graph)
            .into_iter()
            .map(|mut group| {
                apply_limit(&mut group.tasks, limit);
                group
            })
            .collect();

        if json {
            Ok(format_groups_json(&normalized, &groups, &prepared.diagnostics)?)
        } else {
            Ok(format_groups_table(&groups, prepared.today, use_colors))
        }
    } else {
        let mut matched = prepared.engine.execute(&prepared.query, tasks, &graph);
        apply_limit(&mut matched, limit);

        if json {
            Ok(format_tasks_json(&normalized, &matched, &prepared.diagnostics)?)
        } else {
            Ok(format_tasks_table(&matched, prepared.today, use_colors))
        }
    }
}

fn apply_limit(tasks: &mut Vec<&Task>, limit: Option<usize>) {
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }
}
