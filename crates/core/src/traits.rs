//! Core behavioral traits for remotesync components
//!
//! The scheduler and hook pipeline are written against these interfaces
//! instead of concrete implementations, so tests can substitute recording
//! runners and fixed matchers.

use crate::{CommandOutput, ExecContext, Result};
use async_trait::async_trait;
use std::path::Path;

/// Decides whether a path takes part in syncing
///
/// # Examples
///
/// ```ignore
/// if matcher.is_excluded(Path::new("node_modules/left-pad/index.js")) {
///     return Ok(());
/// }
/// ```
pub trait PathMatcher: Send + Sync {
    /// Whether the path (relative to the sync root) is excluded
    fn is_excluded(&self, path: &Path) -> bool;
}

/// A matcher that excludes nothing
impl PathMatcher for () {
    fn is_excluded(&self, _path: &Path) -> bool {
        false
    }
}

/// Executes command strings locally or on the sync target
///
/// Implementations must fail with [`crate::Error::CommandFailed`] when the
/// command exits unsuccessfully and with [`crate::Error::CommandSpawn`] when
/// it cannot be run at all. Callers rely on that split to tell transfer
/// problems apart from runner breakage.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` in the given context and capture its output
    async fn execute(&self, command: &str, context: ExecContext) -> Result<CommandOutput>;
}
