// Configuration loading and parsing (league.toml, engine.toml).

use boxscore_engine::config::{
    CategoryDef, EngineConfig, LeagueSettings, OptimizerConstraints, SampleFields, StreamingConfig,
};
use boxscore_engine::error::ValidationError;
use boxscore_engine::matchup::ScoringPeriod;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league_name: String,
    pub engine: EngineConfig,
    pub period: ScoringPeriod,
    pub data_paths: DataPaths,
    pub output_path: String,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueSection,
    categories: Vec<CategoryDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct LeagueSection {
    name: String,
    num_teams: usize,
    roster: BTreeMap<String, usize>,
}

// ---------------------------------------------------------------------------
// engine.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct EngineFile {
    period: PeriodSection,
    #[serde(default)]
    samples: SampleFields,
    optimizer: OptimizerConstraints,
    #[serde(default)]
    streaming: StreamingConfig,
    data_paths: DataPaths,
    output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
struct PeriodSection {
    id: String,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// League snapshot JSON.
    pub snapshot: String,
    /// Optional CSV of raw player stat rows, replacing the snapshot's players.
    #[serde(default)]
    pub players_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/engine.toml` relative to `base_dir`. Does not copy defaults.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_file: LeagueFile = parse_file(&league_path)?;

    let engine_path = config_dir.join("engine.toml");
    let engine_file: EngineFile = parse_file(&engine_path)?;

    let engine = EngineConfig {
        league: LeagueSettings {
            num_teams: league_file.league.num_teams,
            roster: league_file.league.roster,
        },
        categories: league_file.categories,
        samples: engine_file.samples,
        optimizer: engine_file.optimizer,
        streaming: engine_file.streaming,
    };

    let config = Config {
        league_name: league_file.league.name,
        engine,
        period: ScoringPeriod {
            id: engine_file.period.id,
            start: engine_file.period.start,
            end: engine_file.period.end,
        },
        data_paths: engine_file.data_paths,
        output_path: engine_file.output.path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to `base_dir`, seeding missing files from defaults.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.period.id.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "period.id".into(),
            message: "must not be empty".into(),
        });
    }
    if config.period.end < config.period.start {
        return Err(ConfigError::ValidationError {
            field: "period.end".into(),
            message: format!(
                "must not precede period.start ({} < {})",
                config.period.end, config.period.start
            ),
        });
    }
    if config.data_paths.snapshot.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.snapshot".into(),
            message: "must not be empty".into(),
        });
    }

    // League and category rules live with the engine.
    config.engine.validate().map_err(|e| match e {
        ValidationError::Config { field, message } => ConfigError::ValidationError { field, message },
        other => ConfigError::ValidationError {
            field: "engine".into(),
            message: other.to_string(),
        },
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
