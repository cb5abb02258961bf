//! Field resolution shared by filtering, sorting and grouping.

use serde_json::Value;

use super::vocabulary::Vocabulary;
use crate::task::Task;

/// The value of a field on one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// The field is absent.
    Missing,
    /// A single string value.
    Text(String),
    /// A multi-valued field.
    List(Vec<String>),
}

impl FieldValue {
    /// Absent, empty text and empty lists all count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Stringified value; lists are joined with `", "`.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    fn from_option(value: Option<&String>) -> Self {
        value.map_or(FieldValue::Missing, |v| FieldValue::Text(v.clone()))
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null | Value::Object(_) => FieldValue::Missing,
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            Value::Number(n) => FieldValue::Text(n.to_string()),
            Value::Array(items) => FieldValue::List(
                items
                    .iter()
                    .filter_map(|item| match FieldValue::from_json(item) {
                        FieldValue::Text(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
        }
    }
}

/// Looks up field values on tasks.
///
/// Resolution is pure: the same task and field always give the same value.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'v> {
    vocabulary: &'v Vocabulary,
}

impl<'v> FieldResolver<'v> {
    /// Creates a resolver over the given vocabulary.
    pub fn new(vocabulary: &'v Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Returns the vocabulary this resolver uses.
    pub fn vocabulary(&self) -> &'v Vocabulary {
        self.vocabulary
    }

    /// Maps a field name through the alias table.
    pub fn canonical(&self, field: &str) -> String {
        self.vocabulary.canonical_field(field)
    }

    /// Resolves `field` on `task`.
    ///
    /// Built-in fields read the task directly. Other names walk the task's
    /// extra properties one dotted segment at a time, stopping at the first
    /// missing step.
    pub fn resolve(&self, task: &Task, field: &str) -> FieldValue {
        let canonical = self.canonical(field);

        if let Some(value) = resolve_builtin(task, &canonical) {
            return value;
        }

        let mut segments = canonical.split('.');
        let Some(first) = segments.next() else {
            return FieldValue::Missing;
        };
        if is_builtin(first) {
            // Built-in values have no nested properties.
            return FieldValue::Missing;
        }

        let mut current = match task.properties.get(first) {
            Some(value) => value,
            None => return FieldValue::Missing,
        };
        for segment in segments {
            match current.get(segment) {
                Some(value) => current = value,
                None => return FieldValue::Missing,
            }
        }
        FieldValue::from_json(current)
    }
}

fn is_builtin(name: &str) -> bool {
    super::vocabulary::BUILTIN_FIELDS.contains(&name)
}

fn resolve_builtin(task: &Task, canonical: &str) -> Option<FieldValue> {
    let value = match canonical {
        "id" => FieldValue::Text(task.id.clone()),
        "description" => FieldValue::Text(task.description.clone()),
        "status" => FieldValue::Text(task.status.as_str().to_string()),
        "priority" => FieldValue::Text(task.priority.as_str().to_string()),
        "due" => FieldValue::from_option(task.due.as_ref()),
        "scheduled" => FieldValue::from_option(task.scheduled.as_ref()),
        "start" => FieldValue::from_option(task.start.as_ref()),
        "created" => FieldValue::from_option(task.created.as_ref()),
        "done" => FieldValue::from_option(task.done.as_ref()),
        "tags" => FieldValue::List(task.tags.clone()),
        "path" => FieldValue::Text(task.path.clone()),
        "dependency_id" => FieldValue::from_option(task.dependency_id.as_ref()),
        "depends_on" => FieldValue::List(task.depends_on.clone()),
        "recurrence" => FieldValue::from_option(task.recurrence.as_ref()),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskStatus};
    use serde_json::json;

    fn make_task() -> Task {
        let mut task = Task::new("t1", "Write report");
        task.status = TaskStatus::InProgress;
        task.priority = Priority::High;
        task.due = Some("2025-02-01".to_string());
        task.tags = vec!["#work".to_string(), "#urgent".to_string()];
        task.path = "notes/daily.md".to_string();
        task.properties.insert("owner".to_string(), json!("sam"));
        task.properties.insert(
            "meta".to_string(),
            json!({"estimate": 3, "reviewers": ["ana", "li"], "flags": {"x": true}}),
        );
        task
    }

    #[test]
    fn test_resolve_builtin_fields() {
        let vocab = Vocabulary::default();
        let resolver = FieldResolver::new(&vocab);
        let task = make_task();

        assert_eq!(resolver.resolve(&task, "status"), FieldValue::Text("in-progress".into()));
        assert_eq!(resolver.resolve(&task, "priority"), FieldValue::Text("high".into()));
        assert_eq!(resolver.resolve(&task, "due"), FieldValue::Text("2025-02-01".into()));
        assert_eq!(resolver.resolve(&task, "scheduled"), FieldValue::Missing);
        assert_eq!(
            resolver.resolve(&task, "tags"),
            FieldValue::List(vec!["#work".into(), "#urgent".into()])
        );
    }

    #[test]
    fn test_resolve_aliases() {
        let vocab = Vocabulary::default();
        let resolver = FieldResolver::new(&vocab);
        let task = make_task();

        assert_eq!(resolver.resolve(&task, "tag"), resolver.resolve(&task, "tags"));
        assert_eq!(
            resolver.resolve(&task, "text"),
            FieldValue::Text("Write report".into())
        );
        assert_eq!(
            resolver.resolve(&task, "FILE"),
            FieldValue::Text("notes/daily.md".into())
        );
    }

    #[test]
    fn test_resolve_properties_and_dotted_paths() {
        let vocab = Vocabulary::default();
        let resolver = FieldResolver::new(&vocab);
        let task = make_task();

        assert_eq!(resolver.resolve(&task, "owner"), FieldValue::Text("sam".into()));
        assert_eq!(resolver.resolve(&task, "meta.estimate"), FieldValue::Text("3".into()));
        assert_eq!(
            resolver.resolve(&task, "meta.reviewers"),
            FieldValue::List(vec!["ana".into(), "li".into()])
        );
        assert_eq!(resolver.resolve(&task, "meta.flags.x"), FieldValue::Text("true".into()));
    }

    #[test]
    fn test_dotted_lookup_short_circuits() {
        let vocab = Vocabulary::default();
        let resolver = FieldResolver::new(&vocab);
        let task = make_task();

        assert_eq!(resolver.resolve(&task, "meta.missing.deeper"), FieldValue::Missing);
        assert_eq!(resolver.resolve(&task, "nope.estimate"), FieldValue::Missing);
        assert_eq!(resolver.resolve(&task, "owner.name"), FieldValue::Missing);
        assert_eq!(resolver.resolve(&task, "status.name"), FieldValue::Missing);
        assert_eq!(resolver.resolve(&task, "meta"), FieldValue::Missing);
    }

    #[test]
    fn test_alias_to_dotted_path() {
        let vocab = Vocabulary::default().with_alias("estimate", "meta.estimate");
        let resolver = FieldResolver::new(&vocab);
        assert_eq!(
            resolver.resolve(&make_task(), "estimate"),
            FieldValue::Text("3".into())
        );
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let vocab = Vocabulary::default();
        let resolver = FieldResolver::new(&vocab);
        let task = make_task();
        for field in ["status", "tags", "meta.reviewers", "unknown"] {
            assert_eq!(resolver.resolve(&task, field), resolver.resolve(&task, field));
        }
    }

    #[test]
    fn test_field_value_helpers() {
        assert!(FieldValue::Missing.is_missing());
        assert!(FieldValue::Text(String::new()).is_missing());
        assert!(FieldValue::List(vec![]).is_missing());
        assert!(!FieldValue::Text("x".into()).is_missing());
        assert_eq!(
            FieldValue::List(vec!["a".into(), "b".into()]).to_text(),
            "a, b"
        );
        assert_eq!(FieldValue::Missing.to_text(), "");
    }
}
