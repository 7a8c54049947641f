use crate::error::AppError;
use crate::task_query::CompletedSource;
use crate::task_store::ErrorMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKKEEP_CONFIG_PATH";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub completed_source: CompletedSource,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn error_mode(&self) -> ErrorMode {
        if self.strict {
            ErrorMode::Strict
        } else {
            ErrorMode::Silent
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub strict: Option<bool>,
    pub completed_source: Option<CompletedSource>,
    pub log_level: Option<String>,
}

/// Maps user spellings of a log level onto a `tracing` filter directive.
pub fn canonical_log_level(raw: &str) -> Option<String> {
    let cleaned = raw.trim().to_ascii_lowercase();
    let level = match cleaned.as_str() {
        "warning" => "warn",
        "err" => "error",
        "none" | "silent" | "quiet" => "off",
        other => other,
    };

    LOG_LEVELS
        .contains(&level)
        .then(|| level.to_string())
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskkeep")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskkeep")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

/// Loads the config file, falling back to defaults. A missing file is not
/// an error; an unreadable or malformed one is reported alongside defaults.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

pub fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    normalize_config(config)
}

fn normalize_config(mut config: Config) -> Result<Config, AppError> {
    if let Some(raw) = config.log_level.take() {
        let level = canonical_log_level(&raw)
            .ok_or_else(|| AppError::invalid_data(format!("unknown log_level '{raw}'")))?;
        config.log_level = Some(level);
    }
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(data_dir) = overrides.data_dir.as_ref() {
        merged.data_dir = Some(data_dir.clone());
    }
    if let Some(strict) = overrides.strict {
        merged.strict = strict;
    }
    if let Some(completed_source) = overrides.completed_source {
        merged.completed_source = completed_source;
    }
    if let Some(level) = overrides.log_level.as_deref().and_then(canonical_log_level) {
        merged.log_level = Some(level);
    }

    merged
}
