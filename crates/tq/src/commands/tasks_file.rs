//! Task file loading.
//!
//! A task file is JSON: either a bare array of task records or an object
//! with a `tasks` array.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;
use taskql::Task;
use tracing::debug;

use super::config::Config;
use super::{CommandError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskFile {
    List(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

/// Picks the task file: `--file` / `TQ_TASKS` first, then `tasks_file` from
/// the config. A leading `~/` in the config value is the home directory.
pub fn resolve_tasks_path(file: Option<&Path>, config: &Config) -> Result<PathBuf> {
    file.map(Path::to_path_buf)
        .or_else(|| config.tasks_file.as_deref().map(expand_home))
        .ok_or_else(|| {
            CommandError::Tasks(
                "No task file given. Use --file, set TQ_TASKS, or set tasks_file in the config"
                    .to_string(),
            )
        })
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), BaseDirs::new()) {
        (Ok(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => path.to_path_buf(),
    }
}

/// Reads and parses a task file.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let content = fs::read_to_string(path)
        .map_err(|e| CommandError::Tasks(format!("Failed to read {}: {}", path.display(), e)))?;

    let tasks = parse_tasks(&content)
        .map_err(|e| CommandError::Tasks(format!("Failed to parse {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

fn parse_tasks(content: &str) -> serde_json::Result<Vec<Task>> {
    let file: TaskFile = serde_json::from_str(content)?;
    Ok(match file {
        TaskFile::List(tasks) | TaskFile::Wrapped { tasks } => tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bare_array() {
        let tasks = parse_tasks(r#"[{"id": "a"}, {"id": "b", "status": "done"}]"#).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].id, "b");
        assert!(tasks[1].is_complete());
    }

    #[test]
    fn test_parse_wrapped_object() {
        let tasks = parse_tasks(r##"{"tasks": [{"id": "a", "tags": ["#x"]}]}"##).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].tags, vec!["#x"]);
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(parse_tasks(r#"{"items": []}"#).is_err());
        assert!(parse_tasks(r#"[{"description": "no id"}]"#).is_err());
        assert!(parse_tasks("not json").is_err());
    }

    #[test]
    fn test_resolve_prefers_flag_over_config() {
        let config = Config {
            tasks_file: Some(PathBuf::from("from-config.json")),
            ..Config::default()
        };

        let path = resolve_tasks_path(Some(Path::new("from-flag.json")), &config).unwrap();
        assert_eq!(path, PathBuf::from("from-flag.json"));

        let path = resolve_tasks_path(None, &config).unwrap();
        assert_eq!(path, PathBuf::from("from-config.json"));
    }

    #[test]
    fn test_resolve_expands_home_in_config() {
        let config = Config {
            tasks_file: Some(PathBuf::from("~/notes/tasks.json")),
            ..Config::default()
        };
        let home = BaseDirs::new().unwrap().home_dir().to_path_buf();

        let path = resolve_tasks_path(None, &config).unwrap();
        assert_eq!(path, home.join("notes").join("tasks.json"));

        let path = resolve_tasks_path(Some(Path::new("~user/tasks.json")), &config).unwrap();
        assert_eq!(path, PathBuf::from("~user/tasks.json"));
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(
            expand_home(Path::new("/tmp/tasks.json")),
            PathBuf::from("/tmp/tasks.json")
        );
        assert_eq!(
            expand_home(Path::new("~user/tasks.json")),
            PathBuf::from("~user/tasks.json")
        );
    }

    #[test]
    fn test_resolve_without_any_source() {
        let err = resolve_tasks_path(None, &Config::default()).unwrap_err();
        assert!(matches!(err, CommandError::Tasks(_)));
    }

    #[test]
    fn test_load_tasks_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, r#"[{"id": "t1", "description": "Write"}]"#).unwrap();

        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks[0].description, "Write");
    }

    #[test]
    fn test_load_tasks_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_tasks(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
