//! End-to-end tests that drive the `tq` binary against fixture task files.
//!
//! Every test runs in its own sandbox: a temporary task file and config
//! path, with the relevant environment variables pinned.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Fixed "today" so relative dates do not drift.
const TODAY: &str = "2025-01-15";

fn tq_binary_path() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_tq") {
        return PathBuf::from(path);
    }

    // Fallback for environments where Cargo doesn't export CARGO_BIN_EXE_tq
    let test_binary = env::current_exe().expect("failed to resolve current test executable path");
    let mut candidate = test_binary
        .parent()
        .and_then(|p| p.parent())
        .expect("failed to resolve target/debug directory")
        .join("tq");
    if cfg!(windows) {
        candidate.set_extension("exe");
    }
    candidate
}

fn fixture_tasks() -> Value {
    json!([
        {
            "id": "t1",
            "description": "Write project proposal",
            "status": "in-progress",
            "priority": "high",
            "due": "2025-01-14",
            "tags": ["#work", "#writing"],
            "dependency_id": "proposal"
        },
        {
            "id": "t2",
            "description": "Review proposal with team",
            "priority": "highest",
            "due": "2025-01-20",
            "tags": ["#work"],
            "depends_on": ["proposal"]
        },
        {
            "id": "t3",
            "description": "Buy groceries",
            "status": "done",
            "tags": ["#home"]
        },
        {
            "id": "t4",
            "description": "Plan holiday",
            "priority": "low",
            "owner": "sam"
        }
    ])
}

struct Sandbox {
    dir: TempDir,
    tasks_path: PathBuf,
    config_path: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        Self::with_tasks(&fixture_tasks())
    }

    fn with_tasks(tasks: &Value) -> Self {
        let dir = TempDir::new().expect("failed to create temporary sandbox");
        let tasks_path = dir.path().join("tasks.json");
        let config_path = dir.path().join("config").join("config.toml");
        fs::write(&tasks_path, tasks.to_string()).expect("failed to write task file");
        Self {
            dir,
            tasks_path,
            config_path,
        }
    }

    fn write_config(&self, content: &str) {
        fs::create_dir_all(self.config_path.parent().unwrap()).unwrap();
        fs::write(&self.config_path, content).unwrap();
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(tq_binary_path());
        cmd.args(args);
        cmd.env("TQ_CONFIG", &self.config_path);
        cmd.env("XDG_CONFIG_HOME", self.dir.path().join("xdg"));
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("TQ_TASKS");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Runs with `--file` pointing at the fixture.
    fn run_allow_failure(&self, args: &[&str]) -> Output {
        let tasks = self.tasks_path.to_string_lossy().to_string();
        let mut full: Vec<&str> = vec!["--file", &tasks];
        full.extend_from_slice(args);
        self.command(&full).output().expect("failed to run tq")
    }

    fn run(&self, args: &[&str]) -> Output {
        let output = self.run_allow_failure(args);
        assert!(
            output.status.success(),
            "tq failed\nargs: {:?}\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
            args,
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        output
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout).unwrap_or_else(|err| {
            panic!(
                "command did not emit valid JSON\nargs: {:?}\nerror: {}\nstdout:\n{}",
                args, err, stdout
            )
        })
    }

    fn query_ids(&self, query: &str) -> Vec<String> {
        let value = self.run_json(&["query", query, "--today", TODAY]);
        ids(&value["tasks"])
    }
}

fn ids(tasks: &Value) -> Vec<String> {
    tasks
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|task| task["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Query
// ============================================================================

#[test]
fn test_query_filters_and_sorts() {
    let sandbox = Sandbox::new();

    assert_eq!(
        sandbox.query_ids("not done sort by priority"),
        vec!["t2", "t1", "t4"]
    );
    assert_eq!(sandbox.query_ids("tag includes #work sort by due desc"), vec!["t2", "t1"]);
    assert_eq!(sandbox.query_ids("due before today"), vec!["t1"]);
    assert_eq!(sandbox.query_ids("owner is SAM"), vec!["t4"]);
}

#[test]
fn test_query_dependency_shortcuts() {
    let sandbox = Sandbox::new();

    assert_eq!(sandbox.query_ids("is blocked"), vec!["t2"]);
    assert_eq!(sandbox.query_ids("is blocking"), vec!["t1"]);
    assert_eq!(sandbox.query_ids("depends on proposal"), vec!["t2"]);
    assert_eq!(
        sandbox.query_ids("is not blocked AND not done"),
        vec!["t1", "t4"]
    );
}

#[test]
fn test_query_grouped_json() {
    let sandbox = Sandbox::new();
    let value = sandbox.run_json(&["query", "group by tag", "--today", TODAY]);

    let groups = value["groups"].as_array().unwrap();
    let labels: Vec<&str> = groups
        .iter()
        .map(|group| group["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["#work", "#writing", "#home", "(none)"]);
    assert_eq!(ids(&groups[0]["tasks"]), vec!["t1", "t2"]);
    assert_eq!(groups[0]["count"], 2);
}

#[test]
fn test_query_table_output() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["query", "not done", "--today", TODAY]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.starts_with("ID"));
    assert!(stdout.contains("Write project proposal"));
    assert!(stdout.contains("Yesterday"));
    assert!(!stdout.contains("Buy groceries"));
    assert!(!stdout.contains('\u{1b}'), "NO_COLOR must disable ANSI codes");
}

#[test]
fn test_query_grouped_table_output() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["query", "group by status", "--today", TODAY]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.starts_with("in-progress (1)\n"));
    assert!(stdout.contains("\ntodo (2)\n"));
    assert!(stdout.contains("\ndone (1)\n"));
}

#[test]
fn test_query_empty_result_message() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["query", "tag includes #nothing"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "No tasks found.\n");
}

#[test]
fn test_query_limit() {
    let sandbox = Sandbox::new();
    let value = sandbox.run_json(&["query", "sort by priority", "--limit", "2"]);
    assert_eq!(ids(&value["tasks"]), vec!["t2", "t1"]);
    assert_eq!(value["count"], 2);
}

#[test]
fn test_query_accepts_wrapped_task_file() {
    let sandbox = Sandbox::with_tasks(&json!({ "tasks": fixture_tasks() }));
    assert_eq!(sandbox.query_ids("done").len(), 1);
}

#[test]
fn test_query_tasks_from_env() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command(&["--json", "query", "done"])
        .env("TQ_TASKS", &sandbox.tasks_path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ids(&value["tasks"]), vec!["t3"]);
}

// ============================================================================
// Diagnostics and errors
// ============================================================================

#[test]
fn test_lenient_query_warns_on_stderr() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["query", "stauts is done"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.contains("warning: unknown field 'stauts', did you mean 'status'?"));
}

#[test]
fn test_lenient_query_diagnostics_in_json() {
    let sandbox = Sandbox::new();
    let value = sandbox.run_json(&["query", "status is"]);

    assert_eq!(value["count"], 4);
    assert_eq!(
        value["diagnostics"][0],
        "no value after 'status is'"
    );
}

#[test]
fn test_quiet_suppresses_warnings_and_output() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--quiet", "query", "stauts is done"]);

    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_strict_query_fails_with_json_error() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_allow_failure(&["--json", "query", "status is", "--strict"]);

    assert_eq!(output.status.code(), Some(1));
    let value: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(value["error"]["code"], "QUERY_ERROR");
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("no value after 'status is'"));
}

#[test]
fn test_missing_task_file() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command(&["query", "done"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No task file given"));
}

#[test]
fn test_malformed_task_file() {
    let sandbox = Sandbox::new();
    fs::write(&sandbox.tasks_path, "{ not json").unwrap();
    let output = sandbox.run_allow_failure(&["query", "done"]);

    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse"));
}

#[test]
fn test_invalid_config_file() {
    let sandbox = Sandbox::new();
    sandbox.write_config("version = [");
    let output = sandbox.run_allow_failure(&["query", "done"]);

    assert_eq!(output.status.code(), Some(5));
}

// ============================================================================
// Config-driven behavior
// ============================================================================

#[test]
fn test_config_supplies_tasks_file_aliases_and_saved_queries() {
    let sandbox = Sandbox::new();
    sandbox.write_config(&format!(
        r#"
tasks_file = "{}"
custom_fields = ["owner"]

[aliases]
who = "owner"

[queries]
mine = "who is sam"
"#,
        sandbox.tasks_path.display().to_string().replace('\\', "\\\\")
    ));

    let output = sandbox
        .command(&["--json", "query", "--saved", "mine"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ids(&value["tasks"]), vec!["t4"]);
    assert!(value.get("diagnostics").is_none());
}

#[test]
fn test_config_init_path_and_show() {
    let sandbox = Sandbox::new();

    let output = sandbox.command(&["config", "path"]).output().unwrap();
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        sandbox.config_path.display().to_string()
    );

    let output = sandbox.command(&["config", "init"]).output().unwrap();
    assert!(output.status.success());
    assert!(sandbox.config_path.exists());

    let output = sandbox.command(&["config", "init"]).output().unwrap();
    assert_eq!(output.status.code(), Some(5));

    let output = sandbox
        .command(&["--json", "config", "show"])
        .output()
        .unwrap();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["exists"], true);
    assert_eq!(value["config"]["version"], 1);
}

// ============================================================================
// Explain and completions
// ============================================================================

#[test]
fn test_explain_does_not_need_task_file() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command(&["explain", "not done AND is blocked sort by due desc", "--tokens"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Normalized: (NOT status is done AND is blocked) sort by due desc"));
    assert!(stdout.contains("Tokens:"));
}

#[test]
fn test_explain_json() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command(&["--json", "explain", "priority is high group by tag"])
        .output()
        .unwrap();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["query"]["filter"]["operator"], "is");
    assert_eq!(value["query"]["group"]["field"], "tag");
}

#[test]
fn test_completions() {
    let sandbox = Sandbox::new();
    let output = sandbox.command(&["completions", "bash"]).output().unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("tq"));
}
