//! Ignore pattern matcher with include/exclude support
//!
//! Uses the `ignore` crate (from ripgrep) for gitignore-style pattern matching.
//! Supports negation using ! prefix.
//!
//! Example:
//! ```toml
//! ignore = [
//!     "*.log",           # Ignore log files anywhere
//!     "build/",          # Ignore build directories and their contents
//!     "!build/keep.txt", # Re-include one file
//! ]
//! ```

use crate::ignores::IgnoreRules;
use crate::{Error, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use remotesync_core::PathMatcher;
use std::path::{Path, PathBuf};

/// Ignore pattern matcher using ripgrep's gitignore implementation
///
/// Paths are checked relative to the sync root. A path is excluded when it
/// or any of its parent directories matches, so `build/` also covers
/// `build/out/app.js`.
#[derive(Debug)]
pub struct IgnoreMatcher {
    root: PathBuf,
    gitignore: Gitignore,
    patterns: Vec<String>,
}

impl IgnoreMatcher {
    /// Compile rules for a sync root
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is not valid gitignore syntax
    pub fn new(root: &Path, rules: &IgnoreRules) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);

        for pattern in &rules.patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| Error::Ignore {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
        }

        let gitignore = builder.build().map_err(|e| Error::Ignore {
            pattern: String::new(),
            message: e.to_string(),
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            gitignore,
            patterns: rules.patterns.clone(),
        })
    }

    /// Check if path should be ignored
    ///
    /// The `is_dir` parameter indicates whether the path represents a directory,
    /// which matters for patterns ending with `/`. When `None`, the path is
    /// looked up below the root.
    #[must_use]
    pub fn is_ignored(&self, path: &Path, is_dir: Option<bool>) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                // Nothing outside the root can be mirrored
                Err(_) => return true,
            }
        } else {
            path
        };

        if relative.as_os_str().is_empty() {
            return false;
        }

        let is_dir = is_dir.unwrap_or_else(|| self.root.join(relative).is_dir());

        match self.gitignore.matched_path_or_any_parents(relative, is_dir) {
            ignore::Match::Ignore(_) => true,
            ignore::Match::None | ignore::Match::Whitelist(_) => false,
        }
    }

    /// Patterns this matcher was built from
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Patterns in the form rsync's `--exclude` understands
    ///
    /// Negations are dropped, `**` collapses to `*` and leading/trailing
    /// slashes are trimmed.
    pub fn rsync_excludes(&self) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|p| !p.starts_with('!'))
            .map(|p| p.replace("**", "*").trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl PathMatcher for IgnoreMatcher {
    fn is_excluded(&self, path: &Path) -> bool {
        self.is_ignored(path, None)
    }
}
