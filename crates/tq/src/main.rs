use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::config::load_config;
use commands::tasks_file::{load_tasks, resolve_tasks_path};
use commands::{CommandContext, CommandError};
use dispatch::{StandaloneCommand, StandaloneDispatch, TaskCommand, TaskDispatch};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                match serde_json::to_string_pretty(&error_json) {
                    Ok(text) => eprintln!("{text}"),
                    Err(_) => eprintln!("{error_json}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Sends engine logs to stderr. `-v` raises the default level to debug and
/// `RUST_LOG` overrides both.
fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    // Explain, config, completions and help never touch the task file
    if let Some(dispatch) = StandaloneDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx);
    }

    let Some(dispatch) = TaskDispatch::from_cli(cli) else {
        return Ok(());
    };

    let config = load_config()?;
    let path = resolve_tasks_path(cli.file.as_deref(), &config)?;
    let tasks = load_tasks(&path)?;

    dispatch.execute(&ctx, &config, &tasks)
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Query(_) => "QUERY_ERROR",
        CommandError::Tasks(_) => "TASKS_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit status for an error.
fn error_status(e: &CommandError) -> u8 {
    match e {
        CommandError::Query(_) | CommandError::Json(_) => 1,
        CommandError::Io(_) => 3,
        CommandError::Tasks(_) => 4,
        CommandError::Config(_) => 5,
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    ExitCode::from(error_status(e))
}
