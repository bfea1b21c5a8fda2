//! Per-operation status lines

use crate::operation::{Outcome, SkipReason};
use chrono::Local;
use owo_colors::OwoColorize;
use remotesync_core::{EventType, Result};

/// What a status line is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// One file operation
    File(EventType),
    /// The initial full-tree sync
    Tree,
}

impl SyncAction {
    /// Verb for an in-flight status line
    pub fn progressive(&self) -> &'static str {
        match self {
            SyncAction::File(event) => event.progressive(),
            SyncAction::Tree => "syncing",
        }
    }

    /// Verb for a completed status line
    pub fn past(&self) -> &'static str {
        match self {
            SyncAction::File(event) => event.past(),
            SyncAction::Tree => "synced",
        }
    }
}

/// Terminal state reported for a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Synced
    Done,
    /// Skipped, with the reason
    Skipped(SkipReason),
    /// Failed or rejected, with the reason
    Failed(String),
}

impl Status {
    /// Status for a settled operation, rejections included
    pub fn from_result(result: &Result<Outcome>) -> Self {
        match result {
            Ok(Outcome::Synced) => Status::Done,
            Ok(Outcome::Skipped(reason)) => Status::Skipped(*reason),
            Ok(Outcome::Failed(message)) => Status::Failed(message.clone()),
            Err(e) => Status::Failed(e.to_string()),
        }
    }
}

/// Receives progress for every operation
pub trait StatusReporter: Send + Sync {
    /// A transfer or deletion is about to run
    fn started(&self, path: &str, action: SyncAction);

    /// The operation settled; called exactly once per operation
    fn finished(&self, path: &str, action: SyncAction, status: &Status);
}

/// Prints status lines to the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    mute: bool,
}

impl ConsoleReporter {
    /// Reporter printing to the terminal; `mute` drops per-file lines
    pub fn new(mute: bool) -> Self {
        Self { mute }
    }

    /// Status line text after the marker
    pub fn message(path: &str, action: SyncAction, status: &Status) -> String {
        match status {
            Status::Done => format!("{path} {}", action.past()),
            Status::Skipped(reason) => format!("{path} skipped ({reason})"),
            Status::Failed(message) => {
                format!("{path} {} failed: {message}", action.progressive())
            }
        }
    }
}

impl StatusReporter for ConsoleReporter {
    fn started(&self, path: &str, action: SyncAction) {
        tracing::debug!("… {path} {}...", action.progressive());
    }

    fn finished(&self, path: &str, action: SyncAction, status: &Status) {
        if self.mute {
            return;
        }
        let timestamp = format!("[{}]", Local::now().format("%H:%M:%S"));
        let message = Self::message(path, action, status);
        match status {
            Status::Failed(_) => {
                eprintln!("{} {} {}", timestamp.dimmed(), "✗".bright_red(), message.red());
            }
            Status::Skipped(_) => {
                println!("{} {} {}", timestamp.dimmed(), "✓".bright_green(), message.dimmed());
            }
            Status::Done => {
                println!("{} {} {message}", timestamp.dimmed(), "✓".bright_green());
            }
        }
    }
}
