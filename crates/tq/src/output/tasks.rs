//! Task output formatting.

use chrono::NaiveDate;
use owo_colors::OwoColorize;
use serde::Serialize;
use taskql::query::{QueryError, TaskGroup};
use taskql::Task;

use super::helpers::{format_due, format_priority, format_status, format_tags, truncate_str};

/// JSON output structure for an ungrouped query.
#[derive(Serialize)]
pub struct ListOutput<'a> {
    pub query: String,
    pub count: usize,
    pub tasks: Vec<TaskOutput<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// JSON output structure for a grouped query.
#[derive(Serialize)]
pub struct GroupedOutput<'a> {
    pub query: String,
    pub groups: Vec<GroupOutput<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// JSON output for one group.
#[derive(Serialize)]
pub struct GroupOutput<'a> {
    pub label: &'a str,
    pub count: usize,
    pub tasks: Vec<TaskOutput<'a>>,
}

/// JSON output structure for a single task.
#[derive(Serialize)]
pub struct TaskOutput<'a> {
    pub id: &'a str,
    pub description: &'a str,
    pub status: &'static str,
    pub priority: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub tags: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    pub path: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub depends_on: &'a [String],
}

impl<'a> From<&'a Task> for TaskOutput<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            id: &task.id,
            description: &task.description,
            status: task.status.as_str(),
            priority: task.priority.as_str(),
            due: task.due.as_deref(),
            tags: &task.tags,
            path: &task.path,
            depends_on: &task.depends_on,
        }
    }
}

fn diagnostic_strings(diagnostics: &[QueryError]) -> Vec<String> {
    diagnostics.iter().map(ToString::to_string).collect()
}

/// Formats an ungrouped result as JSON.
pub fn format_tasks_json(
    query: &str,
    tasks: &[&Task],
    diagnostics: &[QueryError],
) -> Result<String, serde_json::Error> {
    let output = ListOutput {
        query: query.to_string(),
        count: tasks.len(),
        tasks: tasks.iter().map(|task| TaskOutput::from(*task)).collect(),
        diagnostics: diagnostic_strings(diagnostics),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a grouped result as JSON.
pub fn format_groups_json(
    query: &str,
    groups: &[TaskGroup<'_>],
    diagnostics: &[QueryError],
) -> Result<String, serde_json::Error> {
    let output = GroupedOutput {
        query: query.to_string(),
        groups: groups
            .iter()
            .map(|group| GroupOutput {
                label: &group.label,
                count: group.tasks.len(),
                tasks: group.tasks.iter().map(|task| TaskOutput::from(*task)).collect(),
            })
            .collect(),
        diagnostics: diagnostic_strings(diagnostics),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats tasks as a table.
pub fn format_tasks_table(tasks: &[&Task], today: NaiveDate, use_colors: bool) -> String {
    if tasks.is_empty() {
        return "No tasks found.\n".to_string();
    }

    let mut output = String::new();

    // Header
    let header = format!(
        "{:<10} {:<8} {:<12} {:<12} {:<18} {}",
        "ID", "Pri", "Status", "Due", "Tags", "Description"
    );
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for task in tasks {
        let line = format!(
            "{:<10} {:<8} {:<12} {:<12} {:<18} {}",
            truncate_str(&task.id, 10),
            format_priority(task.priority, use_colors),
            format_status(task.status, use_colors),
            format_due(task.due.as_deref(), today, use_colors),
            format_tags(&task.tags, 18),
            task.description
        );
        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Formats groups as a sequence of titled tables.
pub fn format_groups_table(groups: &[TaskGroup<'_>], today: NaiveDate, use_colors: bool) -> String {
    if groups.is_empty() {
        return "No tasks found.\n".to_string();
    }

    let mut output = String::new();
    for (index, group) in groups.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        let title = format!("{} ({})", group.label, group.tasks.len());
        if use_colors {
            output.push_str(&format!("{}\n", title.bold()));
        } else {
            output.push_str(&title);
            output.push('\n');
        }
        output.push_str(&format_tasks_table(&group.tasks, today, use_colors));
    }

    output
}
