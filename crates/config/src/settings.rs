//! Effective run settings
//!
//! Command-line flags layered over the persisted [`Config`]. Scripted hooks
//! see these through `HookUtils::settings()`.

use crate::target::{DEFAULT_SSH_PORT, RemoteTarget};
use crate::{Config, Error, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Values given on the command line; `None` means "use the config value"
#[derive(Debug, Clone)]
pub struct Overrides {
    /// `--target`: a configured name or `user@host:/path`
    pub target: String,
    /// `--port`
    pub port: u16,
    /// `--verbose`
    pub verbose: bool,
    /// `--max-parallel`
    pub max_parallel: Option<usize>,
    /// `--delete`
    pub delete: bool,
    /// `--use-gitignore`
    pub use_gitignore: Option<bool>,
    /// `--delete-remote`
    pub delete_remote: Option<bool>,
    /// `--mute-syncs`
    pub mute_syncs: Option<bool>,
}

impl Default for Overrides {
    fn default() -> Self {
        Self {
            target: String::new(),
            port: DEFAULT_SSH_PORT,
            verbose: false,
            max_parallel: None,
            delete: false,
            use_gitignore: None,
            delete_remote: None,
            mute_syncs: None,
        }
    }
}

/// Settings in effect for this run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Local directory being mirrored
    pub root: PathBuf,
    /// Target as given (`staging` or `me@host:/path`)
    pub target_name: String,
    /// Resolved target
    pub target: RemoteTarget,
    /// Echo command output and debug logging
    pub verbose: bool,
    /// Concurrent file operation cap
    pub max_parallel: usize,
    /// Remove extraneous remote files during the initial sync
    pub delete: bool,
    /// Mirror local deletions to the target
    pub delete_remote: bool,
    /// Include `.gitignore` patterns
    pub use_gitignore: bool,
    /// Suppress per-file status lines
    pub mute_syncs: bool,
}

impl SyncSettings {
    /// Layer command-line overrides over the config
    ///
    /// # Errors
    ///
    /// Returns error if the target cannot be resolved or `max_parallel` is zero
    pub fn resolve(config: &Config, overrides: &Overrides, root: PathBuf) -> Result<Self> {
        let target = RemoteTarget::resolve(&overrides.target, &config.targets, overrides.port)?;
        let max_parallel = overrides.max_parallel.unwrap_or(config.max_parallel);
        if max_parallel == 0 {
            return Err(Error::Message(
                "--max-parallel must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            root,
            target_name: overrides.target.clone(),
            target,
            verbose: overrides.verbose,
            max_parallel,
            delete: overrides.delete,
            delete_remote: overrides.delete_remote.unwrap_or(config.delete_remote),
            use_gitignore: overrides.use_gitignore.unwrap_or(config.use_gitignore),
            mute_syncs: overrides.mute_syncs.unwrap_or(config.mute_syncs),
        })
    }

    /// Settings for tests and embedders that do not go through the CLI
    pub fn for_target(root: PathBuf, target: RemoteTarget) -> Self {
        let config = Config::default();
        Self {
            root,
            target_name: target.to_string(),
            target,
            verbose: false,
            max_parallel: config.max_parallel,
            delete: false,
            delete_remote: config.delete_remote,
            use_gitignore: config.use_gitignore,
            mute_syncs: config.mute_syncs,
        }
    }
}
