//! Startup errors
//!
//! Anything that stops remotesync before it begins watching. All of these
//! end the process with exit status 1.

use remotesync_core::Error;
use std::path::PathBuf;
use thiserror::Error;

/// Failure before remotesync starts watching
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartupError {
    /// The sync root does not exist or is not a directory
    #[error("Cannot use {} as the sync root", path.display())]
    Root {
        /// Path as given on the command line
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The tracing subscriber could not be installed
    #[error("Failed to initialize logging")]
    Logging(#[source] Error),

    /// The config file could not be read or parsed
    #[error("Failed to load configuration")]
    Config(#[source] Error),

    /// Flags and config could not be merged into usable settings
    #[error("Invalid settings")]
    Settings(#[source] Error),

    /// An ignore pattern does not compile
    #[error("Failed to compile ignore rules")]
    Ignore(#[source] Error),

    /// A hook script directory could not be read
    #[error("Failed to load hook scripts from {}", path.display())]
    Hooks {
        /// Directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Error,
    },

    /// `beforeSync`, the tree rsync or `afterSync` failed
    #[error("Initial sync failed")]
    InitialSync(#[source] Error),

    /// The filesystem watcher could not be started
    #[error("Failed to watch {}", path.display())]
    Watch {
        /// Directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Error,
    },

    /// The tokio runtime could not be built
    #[error("Failed to start the async runtime")]
    Runtime(#[source] std::io::Error),
}
