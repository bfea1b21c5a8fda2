//! Sync events and command execution contexts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of filesystem change that triggers a sync operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A file appeared
    Add,
    /// An existing file was modified
    Change,
    /// A file was removed
    Delete,
}

impl EventType {
    /// Name used when composing hook names (`beforeFile<Name>`)
    pub fn name(&self) -> &'static str {
        match self {
            EventType::Add => "Add",
            EventType::Change => "Change",
            EventType::Delete => "Delete",
        }
    }

    /// Progressive verb for "in flight" status lines
    pub fn progressive(&self) -> &'static str {
        match self {
            EventType::Add => "adding",
            EventType::Change => "updating",
            EventType::Delete => "deleting",
        }
    }

    /// Past-tense verb for completion status lines
    pub fn past(&self) -> &'static str {
        match self {
            EventType::Add => "added",
            EventType::Change => "updated",
            EventType::Delete => "deleted",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(EventType::Add),
            "change" => Ok(EventType::Change),
            "delete" | "unlink" => Ok(EventType::Delete),
            other => Err(crate::Error::Message(format!("Unknown event type: {other}"))),
        }
    }
}

/// Where a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecContext {
    /// On this machine, in the sync root
    Local,
    /// On the sync target over ssh, in the remote root
    Remote,
}

impl fmt::Display for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecContext::Local => f.write_str("local"),
            ExecContext::Remote => f.write_str("remote"),
        }
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Last non-empty stdout line (rsync prints its summary there)
    pub fn last_stdout_line(&self) -> Option<&str> {
        self.stdout.lines().rev().map(str::trim).find(|l| !l.is_empty())
    }
}
