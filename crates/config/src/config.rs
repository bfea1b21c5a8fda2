//! Configuration management
//!
//! This module handles loading remotesync configuration from `.remotesyncrc`.
//! The file may be JSON (when it starts with `{`) or TOML:
//!
//! ```toml
//! maxParallel = 4
//! deleteRemote = false
//! ignore = ["*.log", "target/"]
//!
//! [targets]
//! staging = "deploy@staging.example.com:/srv/app"
//!
//! [hooks]
//! afterFileChange = { remote = "touch tmp/restart.txt" }
//! ```

use crate::hooks::HooksConfig;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for
pub const CONFIG_FILE_NAME: &str = ".remotesyncrc";

/// Ignore patterns used when the config does not provide any
pub const DEFAULT_IGNORES: &[&str] = &[
    ".*",
    "node_modules/",
    "*.log",
    "dist/",
    "build/",
    "coverage/",
    "tmp/",
    ".git/",
    ".svn/",
    ".DS_Store",
];

/// Persisted remotesync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Named targets, `name -> user@host:/path`
    #[serde(default)]
    pub targets: IndexMap<String, String>,

    /// Ignore patterns (gitignore syntax)
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Maximum number of concurrent file operations
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Declarative hooks
    #[serde(default)]
    pub hooks: HooksConfig,

    /// Suppress per-file status lines
    #[serde(default)]
    pub mute_syncs: bool,

    /// Append `.gitignore` patterns to the ignore list
    #[serde(default = "default_true")]
    pub use_gitignore: bool,

    /// Delete remote files when local files are deleted
    #[serde(default = "default_true")]
    pub delete_remote: bool,
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORES.iter().map(|s| (*s).to_string()).collect()
}

fn default_max_parallel() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: IndexMap::new(),
            ignore: default_ignore(),
            max_parallel: default_max_parallel(),
            hooks: HooksConfig::default(),
            mute_syncs: false,
            use_gitignore: true,
            delete_remote: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: format!("failed to read: {e}"),
        })?;

        Self::from_str_at(&content, path)
    }

    /// Parse configuration content; `origin` is only used in error messages
    pub fn from_str_at(content: &str, origin: &Path) -> Result<Self> {
        let trimmed = content.trim_start();
        let mut config: Self = if trimmed.starts_with('{') {
            serde_json::from_str(content).map_err(|e| Error::Config {
                path: origin.to_path_buf(),
                message: format!("invalid JSON: {e}"),
            })?
        } else {
            toml::from_str(content).map_err(|e| Error::Config {
                path: origin.to_path_buf(),
                message: format!("invalid TOML: {e}"),
            })?
        };

        // An explicitly empty list falls back to the defaults
        if config.ignore.is_empty() {
            tracing::debug!("No ignore patterns in config, using defaults");
            config.ignore = default_ignore();
        }

        if config.max_parallel == 0 {
            return Err(Error::Config {
                path: origin.to_path_buf(),
                message: "maxParallel must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    /// Find the nearest configuration file for `start_dir`
    ///
    /// Search order: `start_dir` and each of its ancestors, then
    /// `~/.remotesyncrc`, then `$XDG_CONFIG_HOME/remotesync/config`.
    pub fn discover(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .chain(crate::dirs::home_config_file())
            .chain(crate::dirs::default_config_file())
            .find(|candidate| candidate.is_file())
    }

    /// Load the discovered configuration, or defaults when there is none
    pub fn load_discovered(start_dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        match Self::discover(start_dir) {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Ok((Self::load(&path)?, Some(path)))
            }
            None => {
                tracing::debug!("No {CONFIG_FILE_NAME} found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }
}
