//! remotesync CLI library
//!
//! Argument parsing and startup wiring for the `remotesync` binary, kept in
//! a library so it can be exercised from tests.

pub mod error;
pub mod session;

use anyhow::Result;
use clap::Parser;
use remotesync_config::Overrides;
use std::path::PathBuf;

use error::StartupError;

/// remotesync - mirror a local directory to a remote host
#[derive(Parser, Debug)]
#[command(name = "remotesync")]
#[command(about = "Watch a directory and mirror it to a remote host over rsync")]
#[command(version)]
#[command(long_about = "Watch a directory and mirror it to a remote host over rsync

Performs a full rsync of the directory on startup, then watches for changes
and mirrors each one individually. Operations on the same file run in order;
different files sync in parallel.

Hooks configured in .remotesyncrc (or scripts in .remotesync/hooks) run
before and after every sync, locally or on the remote host.")]
/// Command-line arguments
pub struct Cli {
    /// Target name from the config, or user@host:/path
    #[arg(short, long, value_name = "TARGET")]
    pub target: String,

    /// SSH port of the remote host
    #[arg(short, long, default_value_t = 22)]
    pub port: u16,

    /// Enable verbose output (shows DEBUG level logs and command output)
    #[arg(short, long)]
    pub verbose: bool,

    /// Maximum number of files synced at once
    #[arg(short, long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Delete extraneous remote files during the initial sync
    #[arg(short, long)]
    pub delete: bool,

    /// Also exclude paths matched by .gitignore
    #[arg(short = 'g', long, value_name = "BOOL")]
    pub use_gitignore: Option<bool>,

    /// Mirror local deletions to the remote host
    #[arg(long, value_name = "BOOL")]
    pub delete_remote: Option<bool>,

    /// Do not print a status line for every synced file
    #[arg(long)]
    pub mute_syncs: bool,

    /// Path to the config file
    #[arg(long, env = "REMOTESYNC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "REMOTESYNC_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Directory of hook scripts (default: <root>/.remotesync/hooks)
    #[arg(long, value_name = "DIR")]
    pub hooks_dir: Option<PathBuf>,

    /// Directory to sync (default: current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl Cli {
    /// Flags that take precedence over the config file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            target: self.target.clone(),
            port: self.port,
            verbose: self.verbose,
            max_parallel: self.max_parallel,
            delete: self.delete,
            use_gitignore: self.use_gitignore,
            delete_remote: self.delete_remote,
            mute_syncs: self.mute_syncs.then_some(true),
        }
    }
}

/// Main entry point for the CLI
///
/// Initial sync, then watch until interrupted.
///
/// # Errors
///
/// Returns an error if startup or the initial sync fails
pub fn run(cli: Cli) -> Result<()> {
    remotesync_config::logging::init(cli.verbose, cli.log_file.as_deref())
        .map_err(StartupError::Logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(session::run(&cli))
}
