//! Multi-key sorting and fan-out grouping.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::ast::{SortDirection, SortKey};
use super::evaluator::parse_date;
use super::resolver::{FieldResolver, FieldValue};
use super::vocabulary::PRIORITY_FIELD;
use crate::task::Task;

/// Label of the bucket for tasks with no value in the group field.
pub const NONE_LABEL: &str = "(none)";

/// Label of the single bucket returned when a query has no group clause.
pub const ALL_LABEL: &str = "all";

const INSTANT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// The comparable form of one sort field on one task.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Rank(u8),
    Instant(NaiveDateTime),
    Text(String),
}

/// Sorts tasks in place by the given keys.
///
/// The sort is stable: tasks equal on every key keep their relative order.
/// For each key, missing values go last when ascending and first when
/// descending.
pub fn sort_tasks(tasks: &mut [&Task], keys: &[SortKey], resolver: &FieldResolver<'_>) {
    if keys.is_empty() || tasks.len() < 2 {
        return;
    }

    // Fields are resolved once per task rather than once per comparison.
    let mut decorated: Vec<(Vec<Option<SortValue>>, &Task)> = tasks
        .iter()
        .map(|task| {
            let values = keys
                .iter()
                .map(|key| sort_value(task, &key.field, resolver))
                .collect();
            (values, *task)
        })
        .collect();

    decorated.sort_by(|(a, _), (b, _)| {
        keys.iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(key, (a, b))| compare_values(a.as_ref(), b.as_ref(), key.direction))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    for (slot, (_, task)) in tasks.iter_mut().zip(decorated) {
        *slot = task;
    }
}

/// Missing is greatest; descending reverses the whole ordering.
fn compare_values(
    a: Option<&SortValue>,
    b: Option<&SortValue>,
    direction: SortDirection,
) -> Ordering {
    let ordering = match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn sort_value(task: &Task, field: &str, resolver: &FieldResolver<'_>) -> Option<SortValue> {
    let value = resolver.resolve(task, field);
    if value.is_missing() {
        return None;
    }

    let canonical = resolver.canonical(field);
    let vocabulary = resolver.vocabulary();
    if canonical == PRIORITY_FIELD {
        return Some(SortValue::Rank(vocabulary.priority_rank(&value.to_text())));
    }
    if vocabulary.is_date_field(&canonical) {
        return parse_instant(&value.to_text()).map(SortValue::Instant);
    }
    Some(SortValue::Text(value.to_text()))
}

/// Parses a date or date-time; a bare date is midnight.
pub(crate) fn parse_instant(text: &str) -> Option<NaiveDateTime> {
    INSTANT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

/// One bucket of grouped results.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGroup<'t> {
    pub label: String,
    pub tasks: Vec<&'t Task>,
}

/// Grouped results, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGroups<'t> {
    groups: Vec<TaskGroup<'t>>,
    index: HashMap<String, usize>,
}

impl<'t> TaskGroups<'t> {
    /// A single bucket holding every task.
    pub fn single(label: impl Into<String>, tasks: Vec<&'t Task>) -> Self {
        let mut groups = Self::default();
        let label = label.into();
        groups.index.insert(label.clone(), 0);
        groups.groups.push(TaskGroup { label, tasks });
        groups
    }

    fn push(&mut self, label: &str, task: &'t Task) {
        match self.index.get(label) {
            Some(&position) => self.groups[position].tasks.push(task),
            None => {
                self.index.insert(label.to_string(), self.groups.len());
                self.groups.push(TaskGroup {
                    label: label.to_string(),
                    tasks: vec![task],
                });
            }
        }
    }

    /// Returns the tasks in the bucket with this label.
    pub fn get(&self, label: &str) -> Option<&[&'t Task]> {
        self.index
            .get(label)
            .map(|&position| self.groups[position].tasks.as_slice())
    }

    /// Bucket labels, in order of first appearance.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.label.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskGroup<'t>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'t> IntoIterator for TaskGroups<'t> {
    type Item = TaskGroup<'t>;
    type IntoIter = std::vec::IntoIter<TaskGroup<'t>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'a, 't> IntoIterator for &'a TaskGroups<'t> {
    type Item = &'a TaskGroup<'t>;
    type IntoIter = std::slice::Iter<'a, TaskGroup<'t>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Partitions tasks by a field, keeping each bucket in input order.
///
/// A list value puts the task in one bucket per distinct element. Missing or
/// empty values go to [`NONE_LABEL`].
pub fn group_tasks<'t>(
    tasks: &[&'t Task],
    field: &str,
    resolver: &FieldResolver<'_>,
) -> TaskGroups<'t> {
    let mut groups = TaskGroups::default();
    for &task in tasks {
        let labels = group_labels(resolver.resolve(task, field));
        if labels.is_empty() {
            groups.push(NONE_LABEL, task);
            continue;
        }
        for label in &labels {
            groups.push(label, task);
        }
    }
    groups
}

fn group_labels(value: FieldValue) -> Vec<String> {
    match value {
        FieldValue::Missing => Vec::new(),
        FieldValue::Text(text) if text.is_empty() => Vec::new(),
        FieldValue::Text(text) => vec![text],
        FieldValue::List(items) => {
            let mut labels: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                if !item.is_empty() && !labels.contains(&item) {
                    labels.push(item);
                }
            }
            labels
        }
    }
}
