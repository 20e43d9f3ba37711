//! Layered runtime settings.
//!
//! Sources, highest priority first:
//! 1. `BOOKSHELF_*` environment variables (`__` separates nested keys, for
//!    example `BOOKSHELF_DATABASE__PATH`), after loading `.env` if present
//! 2. the settings file (`bookshelf.toml`, or the path in `BOOKSHELF_CONFIG`)
//! 3. built-in defaults

use crate::logging::{default_log_level, LogLevel, LoggingError};
use crate::query::GENRE_SEARCH_LIMIT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "bookshelf.toml";
const CONFIG_FILE_ENV: &str = "BOOKSHELF_CONFIG";
const ENV_PREFIX: &str = "BOOKSHELF";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Source(#[from] config::ConfigError),
    #[error("invalid logging.level: {0}")]
    Level(#[from] LoggingError),
    #[error("search.genre_limit must be greater than zero")]
    ZeroGenreLimit,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub search: SearchSettings,
}

impl Settings {
    /// Loads `.env`, the settings file and the environment overlay.
    pub fn load() -> Result<Self, SettingsError> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Loads `path` (optional) and the environment overlay.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        LogLevel::parse(&self.logging.level)?;
        if self.search.genre_limit == 0 {
            return Err(SettingsError::ZeroGenreLimit);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_path")]
    pub path: PathBuf,
}

impl DatabaseSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("bookshelf.sqlite3")
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    #[serde(default = "LoggingSettings::default_level")]
    pub level: String,
    /// File logging stays off when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl LoggingSettings {
    fn default_level() -> String {
        default_log_level().to_string()
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchSettings {
    #[serde(default = "SearchSettings::default_genre_limit")]
    pub genre_limit: usize,
}

impl SearchSettings {
    fn default_genre_limit() -> usize {
        GENRE_SEARCH_LIMIT
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            genre_limit: Self::default_genre_limit(),
        }
    }
}
