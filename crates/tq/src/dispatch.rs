//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Commands split by whether they need the task file loaded first.

use chrono::NaiveDate;
use taskql::Task;

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::config::Config;
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for commands that run without a task file.
pub trait StandaloneCommand {
    /// Execute the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Trait for commands that run over loaded tasks.
pub trait TaskCommand {
    /// Execute the command over `tasks`.
    fn execute(&self, ctx: &CommandContext, config: &Config, tasks: &[Task]) -> Result<()>;
}

/// Commands that don't read the task file.
pub enum StandaloneDispatch<'a> {
    Explain {
        query: &'a str,
        saved: bool,
        tokens: bool,
    },
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Help,
}

impl<'a> StandaloneDispatch<'a> {
    /// Try to create a standalone dispatch from the CLI command.
    /// Returns None if the command needs the task file.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Explain {
                query,
                saved,
                tokens,
            }) => Some(Self::Explain {
                query,
                saved: *saved,
                tokens: *tokens,
            }),
            Some(Commands::Config { command }) => Some(Self::Config(command)),
            Some(Commands::Completions { shell }) => Some(Self::Completions(shell)),
            None => Some(Self::Help),
            Some(Commands::Query { .. }) => None,
        }
    }
}

impl StandaloneCommand for StandaloneDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Explain {
                query,
                saved,
                tokens,
            } => {
                let opts = commands::explain::ExplainOptions {
                    query,
                    saved: *saved,
                    tokens: *tokens,
                };
                commands::explain::execute(ctx, &opts)
            }
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("tq - task query CLI");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, *force),
    }
}

/// Commands that need the task file.
pub enum TaskDispatch<'a> {
    Query {
        query: &'a str,
        saved: bool,
        strict: bool,
        limit: Option<usize>,
        today: Option<NaiveDate>,
    },
}

impl<'a> TaskDispatch<'a> {
    /// Create a task dispatch from the CLI command.
    /// Returns None for commands handled by [`StandaloneDispatch`].
    pub fn from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Query {
                query,
                saved,
                strict,
                limit,
                today,
            }) => Some(Self::Query {
                query,
                saved: *saved,
                strict: *strict,
                limit: *limit,
                today: *today,
            }),
            Some(Commands::Explain { .. })
            | Some(Commands::Config { .. })
            | Some(Commands::Completions { .. })
            | None => None,
        }
    }
}

impl TaskCommand for TaskDispatch<'_> {
    fn execute(&self, ctx: &CommandContext, config: &Config, tasks: &[Task]) -> Result<()> {
        match self {
            Self::Query {
                query,
                saved,
                strict,
                limit,
                today,
            } => {
                let opts = commands::query::QueryOptions {
                    query,
                    saved: *saved,
                    strict: *strict,
                    limit: *limit,
                    today: *today,
                };
                commands::query::execute(ctx, &opts, config, tasks)
            }
        }
    }
}
