//! Configuration management for remotesync
//!
//! This crate handles:
//! - Configuration loading and discovery (`.remotesyncrc`)
//! - Hook configuration
//! - Target resolution
//! - Ignore rule collection and matching
//! - Effective run settings
//! - Logging initialization

pub mod config;
pub mod dirs;
pub mod hooks;
pub mod ignores;
pub mod logging;
pub mod patterns;
pub mod settings;
pub mod target;

// Re-export error types from core
pub use remotesync_core::{Error, Result};

// Re-export main types
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_IGNORES};
pub use hooks::{CommandPair, HookCommand, HookName, HookSpec, HookStage, HooksConfig};
pub use ignores::IgnoreRules;
pub use patterns::IgnoreMatcher;
pub use settings::{Overrides, SyncSettings};
pub use target::RemoteTarget;
