//! Base error types for remotesync
//!
//! This module provides the foundation error types that all crates can use.

use crate::event::ExecContext;
use std::path::PathBuf;
use thiserror::Error;

/// Base error type for shared functionality
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A command could not be started or its output could not be collected
    #[error("Failed to run {context} command '{command}': {source}")]
    CommandSpawn {
        /// Command line as given to the shell
        command: String,
        /// Where it was meant to run
        context: ExecContext,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A command ran but exited unsuccessfully
    #[error("{context} command '{command}' exited with {}: {}", code.map_or_else(|| "signal".to_string(), |c| format!("status {c}")), stderr.trim())]
    CommandFailed {
        /// Command line as given to the runner
        command: String,
        /// Where it ran
        context: ExecContext,
        /// Exit status, `None` when killed by a signal
        code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// Hook configuration error
    #[error("Hook configuration error: {0}")]
    HookConfig(String),

    /// Hook execution error
    #[error("Hook '{hook}' failed: {source}")]
    HookExecution {
        /// Hook name, e.g. `beforeFileAdd`
        hook: String,
        /// What the hook raised
        #[source]
        source: Box<Error>,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// The sync target could not be resolved into host and path
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Ignore pattern could not be compiled
    #[error("Invalid ignore pattern '{pattern}': {message}")]
    Ignore { pattern: String, message: String },

    /// The scheduler loop is gone and can no longer accept or settle work
    #[error("Scheduler is no longer running")]
    SchedulerClosed,

    /// Filesystem watcher error
    #[error("Watcher error: {0}")]
    Watch(String),

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Wrap an error raised while running the named hook
    pub fn hook(hook: impl Into<String>, source: Error) -> Self {
        Error::HookExecution {
            hook: hook.into(),
            source: Box::new(source),
        }
    }

    /// Captured stderr when this is a failed command, empty otherwise
    pub fn stderr(&self) -> &str {
        match self {
            Error::CommandFailed { stderr, .. } => stderr,
            Error::HookExecution { source, .. } => source.stderr(),
            _ => "",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
