use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskkeep_core::config::{ConfigOverrides, canonical_log_level};
use taskkeep_core::task_query::CompletedSource;

#[derive(Parser, Debug)]
#[command(name = "taskkeep", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Report storage faults and unknown task ids as errors
    #[arg(long, global = true)]
    pub strict: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskkeep add "Buy milk" "2%"
    Add {
        title: Option<String>,
        description: Option<String>,
    },
    /// Replace a task's title and description
    ///
    /// Example: taskkeep edit 1735000000000 "Buy oat milk" "1 litre"
    Edit {
        id: String,
        title: String,
        description: String,
    },
    /// Delete a task
    ///
    /// Example: taskkeep delete 1735000000000
    Delete {
        id: String,
    },
    /// Mark a task completed, or reopen a completed one
    ///
    /// Example: taskkeep toggle 1735000000000
    Toggle {
        id: String,
    },
    /// Show details of a task
    ///
    /// Example: taskkeep show 1735000000000
    Show {
        id: String,
    },
    /// List all tasks, newest first
    List,
    /// List completed tasks, most recently completed first
    Completed,
    /// Rebuild the completed list from the task list
    Repair,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    DataDir,
    Strict,
    CompletedSource,
    LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "data_dir" | "dir" => ConfigOverrideTarget::DataDir,
        "strict" => ConfigOverrideTarget::Strict,
        "completed_source" => ConfigOverrideTarget::CompletedSource,
        "log_level" | "log" => ConfigOverrideTarget::LogLevel,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Collects `--strict` and every `--config-override` into one override set.
/// Later overrides win over earlier ones.
pub fn overrides_from_cli(cli: &Cli) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for raw in &cli.config_override {
        let parsed = parse_config_override(raw)?;
        match parsed.target {
            ConfigOverrideTarget::DataDir => {
                if parsed.value.is_empty() {
                    return Err("data_dir override cannot be empty".to_string());
                }
                overrides.data_dir = Some(PathBuf::from(parsed.value));
            }
            ConfigOverrideTarget::Strict => {
                overrides.strict = Some(parse_flag(&parsed.value)?);
            }
            ConfigOverrideTarget::CompletedSource => {
                let source = parsed
                    .value
                    .parse::<CompletedSource>()
                    .map_err(|err| err.message().to_string())?;
                overrides.completed_source = Some(source);
            }
            ConfigOverrideTarget::LogLevel => {
                let level = canonical_log_level(&parsed.value)
                    .ok_or_else(|| format!("unknown log level '{}'", parsed.value))?;
                overrides.log_level = Some(level);
            }
        }
    }

    if cli.strict {
        overrides.strict = Some(true);
    }

    Ok(overrides)
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("expected true or false, got '{other}'")),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
