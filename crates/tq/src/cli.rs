//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the tq CLI.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// tq - Query task records from the command line
#[derive(Parser, Debug)]
#[command(name = "tq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Task file to query (JSON array, or an object with a "tasks" array)
    #[arg(short, long, global = true, env = "TQ_TASKS")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query against the task file
    #[command(alias = "q")]
    Query {
        /// Query text, e.g. "not done AND tag includes #work sort by due"
        #[arg(default_value = "")]
        query: String,

        /// Treat QUERY as the name of a saved query from the config file
        #[arg(short, long)]
        saved: bool,

        /// Reject queries the lenient parser would have to repair
        #[arg(long)]
        strict: bool,

        /// Maximum number of tasks shown (per group when grouping)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Date used for today/tomorrow/yesterday (default: local date)
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<NaiveDate>,
    },

    /// Show how a query is tokenized and parsed
    #[command(alias = "x")]
    Explain {
        /// Query text to explain
        query: String,

        /// Treat QUERY as the name of a saved query from the config file
        #[arg(short, long)]
        saved: bool,

        /// Include the token stream
        #[arg(long)]
        tokens: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print config file path
    Path,

    /// Write a commented default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // This verifies that the CLI is correctly defined
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["tq", "--verbose", "query"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(!cli.json);

        let cli = Cli::parse_from(["tq", "--quiet", "--json", "query"]);
        assert!(!cli.verbose);
        assert!(cli.quiet);
        assert!(cli.json);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["tq", "--verbose", "--quiet", "query"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_color_flag() {
        let cli = Cli::parse_from(["tq", "--no-color", "query"]);
        assert!(cli.no_color);
    }

    #[test]
    fn test_file_flag_is_global() {
        let cli = Cli::parse_from(["tq", "query", "done", "--file", "tasks.json"]);
        assert_eq!(cli.file, Some(PathBuf::from("tasks.json")));
    }

    #[test]
    fn test_query_defaults() {
        let cli = Cli::parse_from(["tq", "query"]);
        match cli.command {
            Some(Commands::Query {
                query,
                saved,
                strict,
                limit,
                today,
            }) => {
                assert_eq!(query, "");
                assert!(!saved);
                assert!(!strict);
                assert!(limit.is_none());
                assert!(today.is_none());
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_query_options() {
        let cli = Cli::parse_from([
            "tq",
            "q",
            "not done sort by due",
            "--strict",
            "--limit",
            "5",
            "--today",
            "2025-01-15",
        ]);
        match cli.command {
            Some(Commands::Query {
                query,
                strict,
                limit,
                today,
                ..
            }) => {
                assert_eq!(query, "not done sort by due");
                assert!(strict);
                assert_eq!(limit, Some(5));
                assert_eq!(today, NaiveDate::from_ymd_opt(2025, 1, 15));
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_query_rejects_bad_today() {
        let result = Cli::try_parse_from(["tq", "query", "done", "--today", "15/01/2025"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_saved_query_flag() {
        let cli = Cli::parse_from(["tq", "query", "-s", "inbox"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Query { saved: true, ref query, .. }) if query == "inbox"
        ));
    }

    #[test]
    fn test_explain_command() {
        let cli = Cli::parse_from(["tq", "explain", "is blocked", "--tokens"]);
        match cli.command {
            Some(Commands::Explain {
                query,
                saved,
                tokens,
            }) => {
                assert_eq!(query, "is blocked");
                assert!(!saved);
                assert!(tokens);
            }
            _ => panic!("Expected Explain command"),
        }
    }

    #[test]
    fn test_explain_requires_query() {
        let result = Cli::try_parse_from(["tq", "explain"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["tq", "config"]);
        assert!(matches!(cli.command, Some(Commands::Config { command: None })));

        let cli = Cli::parse_from(["tq", "config", "path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: Some(ConfigCommands::Path)
            })
        ));

        let cli = Cli::parse_from(["tq", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: Some(ConfigCommands::Init { force: true })
            })
        ));
    }

    #[test]
    fn test_completions_command() {
        let cli = Cli::parse_from(["tq", "completions", "zsh"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Completions { shell: Shell::Zsh })
        ));
    }
}
