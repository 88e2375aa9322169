//! Dashboard configuration.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults (data in the working directory, builtin site registry)
//! 2. an optional TOML file (`coldchain.toml`)
//! 3. environment variables, with a `.env` file honoured via `dotenv`
//!
//! | Variable               | Overrides              |
//! |------------------------|------------------------|
//! | `COLDCHAIN_DATA_DIR`   | `data_dir`             |
//! | `COLDCHAIN_SOURCES`    | `sources_file`         |
//! | `COLDCHAIN_BOUNDARY`   | `boundary_file`        |
//! | `COLDCHAIN_LOG_LEVEL`  | `logging.level`        |
//! | `COLDCHAIN_LOG_FILE`   | `logging.file`         |
//!
//! Relative `sources_file` and `boundary_file` paths are resolved against
//! `data_dir`, so one override of the data directory moves both with it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::logging::parse_level;
use crate::model::{ColdChainError, Result};
use crate::sites::SiteRegistry;

pub const DEFAULT_CONFIG_FILE: &str = "coldchain.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the sensor logs and the boundary file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Site registry file, relative to `data_dir` unless absolute; the
    /// builtin network is used when unset
    #[serde(default)]
    pub sources_file: Option<PathBuf>,
    /// City View polygon, relative to `data_dir` unless absolute
    #[serde(default = "default_boundary_file")]
    pub boundary_file: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "error", "warn", "info", "debug", "trace" or "off"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Append log entries to this file as well as the console
    #[serde(default)]
    pub file: Option<String>,
    /// Prefix console lines with UTC timestamps
    #[serde(default)]
    pub console_timestamps: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_boundary_file() -> PathBuf {
    PathBuf::from("map.kml")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            console_timestamps: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sources_file: None,
            boundary_file: default_boundary_file(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)
            .map_err(|e| ColdChainError::Config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the TOML file at `path`. A missing file yields the defaults;
    /// an unreadable or invalid one is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ColdChainError::Config(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Full layered load: file, then `.env` and process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::from_file(path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE)))?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("COLDCHAIN_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("COLDCHAIN_SOURCES") {
            self.sources_file = Some(PathBuf::from(file));
        }
        if let Some(file) = lookup("COLDCHAIN_BOUNDARY") {
            self.boundary_file = PathBuf::from(file);
        }
        if let Some(level) = lookup("COLDCHAIN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(file) = lookup("COLDCHAIN_LOG_FILE") {
            self.logging.file = Some(file);
        }
    }

    fn validate(&self) -> Result<()> {
        if parse_level(&self.logging.level).is_none() {
            return Err(ColdChainError::Config(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> LevelFilter {
        parse_level(&self.logging.level).unwrap_or(LevelFilter::Info)
    }

    pub fn boundary_path(&self) -> PathBuf {
        self.data_dir.join(&self.boundary_file)
    }

    pub fn sources_path(&self) -> Option<PathBuf> {
        self.sources_file.as_ref().map(|file| self.data_dir.join(file))
    }

    /// The configured site registry, or the builtin one.
    pub fn site_registry(&self) -> Result<SiteRegistry> {
        match self.sources_path() {
            Some(path) => SiteRegistry::load(&path),
            None => Ok(SiteRegistry::builtin()),
        }
    }
}
