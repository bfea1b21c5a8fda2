//! # remotesync engine
//!
//! Everything between a filesystem event and the remote copy:
//!
//! - **Scheduler**: per-key FIFO queues under a global concurrency cap
//! - **Processor**: the hook / transfer / hook lifecycle of one operation
//! - **Hooks**: scripted and declarative lifecycle hooks
//! - **Transfer**: rsync and remote `rm` command construction
//! - **Runner**: local shell and ssh command execution
//! - **Watcher**: debounced filesystem events
//! - **Status**: one status line per settled operation

pub mod hooks;
pub mod initial_sync;
pub mod operation;
pub mod processor;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod transfer;
pub mod watcher;

// Re-export error types from core
pub use remotesync_core::{Error, Result};

// Re-export commonly used types
pub use hooks::{HookPipeline, ScriptedHooks};
pub use initial_sync::InitialSync;
pub use operation::{Operation, Outcome, SkipReason};
pub use processor::OperationProcessor;
pub use runner::ShellRunner;
pub use scheduler::{CompletionHandle, OperationHandler, Scheduler, SchedulerSnapshot};
pub use status::{ConsoleReporter, Status, StatusReporter, SyncAction};
pub use transfer::{RsyncCommand, Transfer, TransferReport};
pub use watcher::{FileWatcher, WatchEvent, WatcherConfig};
