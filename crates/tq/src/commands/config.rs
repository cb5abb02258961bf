//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/tq/config.toml.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use taskql::query::Vocabulary;

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# tq - task query CLI configuration

# Config schema version (do not modify)
version = 1

# Task file queried when --file / TQ_TASKS is not given
# tasks_file = "~/notes/tasks.json"

# Extra property names to accept without an "unknown field" warning
# custom_fields = ["owner", "estimate"]

# Output preferences
[output]
# color = true              # Enable colors (respects NO_COLOR env)

# Extra field aliases: short name = canonical field
[aliases]
# who = "owner"

# Saved queries, run with `tq query --saved <name>`
[queries]
# next = "not done AND is not blocked sort by priority, due"
# week = "due before 2025-01-08 group by status"
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default task file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_file: Option<PathBuf>,

    /// Property names declared as known fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<String>,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Extra field aliases, short name to canonical field.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Saved queries by name.
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            tasks_file: None,
            custom_fields: Vec::new(),
            output: OutputConfig::default(),
            aliases: BTreeMap::new(),
            queries: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Builds the query vocabulary: built-in tables plus configured aliases
    /// and custom fields.
    pub fn vocabulary(&self) -> Vocabulary {
        let vocabulary = self
            .aliases
            .iter()
            .fold(Vocabulary::default(), |vocabulary, (short, canonical)| {
                vocabulary.with_alias(short, canonical.clone())
            });
        self.custom_fields
            .iter()
            .fold(vocabulary, |vocabulary, field| {
                vocabulary.with_custom_field(field.clone())
            })
    }

    /// Looks up a saved query by name.
    pub fn saved_query(&self, name: &str) -> Result<&str> {
        self.queries.get(name).map(String::as_str).ok_or_else(|| {
            let known: Vec<&str> = self.queries.keys().map(String::as_str).collect();
            let hint = if known.is_empty() {
                "no queries are saved".to_string()
            } else {
                format!("saved queries: {}", known.join(", "))
            };
            CommandError::Config(format!("Unknown saved query '{}' ({})", name, hint))
        })
    }

    /// Returns the query text: the argument itself, or the saved query it names.
    pub fn resolve_query<'a>(&'a self, query: &'a str, saved: bool) -> Result<&'a str> {
        if saved {
            self.saved_query(query)
        } else {
            Ok(query)
        }
    }

    /// Whether colored output is allowed by the config file.
    pub fn color_enabled(&self) -> bool {
        self.output.color.unwrap_or(true)
    }
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/tq/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    // Check for override env var first
    if let Ok(path) = env::var("TQ_CONFIG") {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            return Ok(parent.to_path_buf());
        }
    }

    // Use XDG_CONFIG_HOME if set, otherwise ~/.config/tq
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("tq"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("tq"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    // Check for override env var first
    if let Ok(path) = env::var("TQ_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
///
/// A missing file yields the default configuration.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    parse_config(&content)
}

/// Parses config file contents and migrates them to the current version.
fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
/// Returns the config as-is if already at current version.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        return Err(CommandError::Config(format!(
            "Config version {} is newer than this tq understands (max {})",
            config.version, CONFIG_VERSION
        )));
    }

    // Version 1 is the initial schema; later versions migrate step by step here.
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if path.exists() {
            println!("Settings:");
            if let Some(ref tasks_file) = config.tasks_file {
                println!("  tasks_file: {}", tasks_file.display());
            }
            if !config.custom_fields.is_empty() {
                println!("  custom_fields: {}", config.custom_fields.join(", "));
            }

            println!("\n[output]");
            if let Some(color) = config.output.color {
                println!("  color: {}", color);
            }

            println!("\n[aliases]");
            for (short, canonical) in &config.aliases {
                println!("  {} = {}", short, canonical);
            }

            println!("\n[queries]");
            for (name, query) in &config.queries {
                println!("  {} = {}", name, query);
            }
        } else {
            println!("(No config file exists. Run 'tq config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command.
///
/// Writes the commented default config. An existing file is only replaced
/// with `force`.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    // Ensure directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created config at: {}", path.display());
    }

    Ok(())
}
