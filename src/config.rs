//! Viewer configuration.
//!
//! Settings come from a TOML file, looked up in this order:
//!
//! 1. the path given with `--config`
//! 2. `./sqlvis.toml`
//! 3. `sqlvis.toml` in the platform config directory (XDG on Linux)
//!
//! A missing file means defaults. Command-line flags override the file.
//!
//! ```toml
//! database = "sales.db"
//! exclude = ["id", "customer_id"]
//! log_file = "query.log"
//! stats_on = false
//! color = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched in the working and config directories.
pub const CONFIG_FILE_NAME: &str = "sqlvis.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Settings for one viewer process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// SQLite database file; `None` opens a private in-memory database.
    pub database: Option<PathBuf>,
    /// Columns never visualized, typically keys.
    pub exclude: Vec<String>,
    /// Append-only transcript of queries and rendered output.
    pub log_file: PathBuf,
    /// Show the statistics block on every render.
    pub stats_on: bool,
    /// Colour bars and the status line.
    pub color: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            database: None,
            exclude: Vec::new(),
            log_file: PathBuf::from("query.log"),
            stats_on: false,
            color: true,
        }
    }
}

impl ViewerConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Read one file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Resolve the config file and load it; defaults when none exists.
    ///
    /// An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load_from(path)?, Some(path.to_path_buf())));
        }
        for candidate in candidate_paths() {
            if candidate.is_file() {
                return Ok((Self::load_from(&candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Extend the exclusion list with comma-separated entries.
    pub fn add_excludes<S: AsRef<str>>(&mut self, entries: &[S]) {
        for entry in entries {
            self.exclude
                .extend(entry.as_ref().split(',').map(str::to_string));
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.exclude = self
            .exclude
            .iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::Validation("log_file cannot be empty".into()));
        }
        if let Some(db) = &self.database
            && db.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation("database cannot be empty".into()));
        }
        Ok(())
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = directories::ProjectDirs::from("io", "sqlvis", "sqlvis") {
        paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    paths
}
