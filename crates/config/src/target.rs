//! Sync target resolution
//!
//! A target is either a name from the `targets` table or an scp-style URI
//! (`user@host:/path/to/dir`).

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Default ssh port; no port flags are emitted for it
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Where files are mirrored to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteTarget {
    /// ssh destination (`user@host` or a host alias)
    pub destination: String,
    /// Remote root directory
    pub path: String,
    /// ssh port
    pub port: u16,
}

impl RemoteTarget {
    /// Parse an scp-style URI
    pub fn parse(uri: &str, port: u16) -> Result<Self> {
        let (destination, path) = uri.split_once(':').ok_or_else(|| Error::InvalidTarget {
            target: uri.to_string(),
            reason: "expected <user@host>:<path>".to_string(),
        })?;

        if destination.is_empty() {
            return Err(Error::InvalidTarget {
                target: uri.to_string(),
                reason: "missing host".to_string(),
            });
        }

        let path = path.trim_end_matches('/');
        let path = if path.is_empty() { "." } else { path };

        Ok(Self {
            destination: destination.to_string(),
            path: path.to_string(),
            port,
        })
    }

    /// Resolve a `--target` value against the configured `targets` table
    pub fn resolve(target: &str, targets: &IndexMap<String, String>, port: u16) -> Result<Self> {
        let uri = targets.get(target).map_or(target, String::as_str);
        Self::parse(uri, port)
    }

    /// rsync destination for the remote root, with trailing slash
    pub fn rsync_root(&self) -> String {
        format!("{}:{}/", self.destination, self.path)
    }

    /// rsync destination for a directory below the remote root, with trailing slash
    pub fn rsync_dir(&self, relative_dir: &str) -> String {
        let relative_dir = relative_dir.trim_matches('/');
        if relative_dir.is_empty() || relative_dir == "." {
            self.rsync_root()
        } else {
            format!("{}:{}/{}/", self.destination, self.path, relative_dir)
        }
    }

    /// Whether a non-default port needs to be passed to ssh
    pub fn has_custom_port(&self) -> bool {
        self.port != DEFAULT_SSH_PORT
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.destination, self.path)?;
        if self.has_custom_port() {
            write!(f, " (port {})", self.port)?;
        }
        Ok(())
    }
}
