//! Ignore pattern collection
//!
//! Gathers the patterns that decide which paths are mirrored: the configured
//! `ignore` list, a few editor/OS leftovers that are always skipped, and
//! optionally the root `.gitignore`.

use crate::{Config, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Patterns appended to every rule set
pub const EXTRA_IGNORES: &[&str] = &[
    ".idea/",
    ".vscode/",
    "node_modules/",
    ".DS_Store",
    "Thumbs.db",
];

/// Ordered ignore patterns in gitignore syntax
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    /// All patterns in evaluation order (later patterns win)
    pub patterns: Vec<String>,
}

impl IgnoreRules {
    /// Collect the rules for a sync root
    ///
    /// # Errors
    ///
    /// Returns error if `.gitignore` exists but cannot be read
    pub fn collect(config: &Config, root: &Path, use_gitignore: bool) -> Result<Self> {
        let mut patterns = config.ignore.clone();

        if use_gitignore {
            let gitignore = read_gitignore(root)?;
            if !gitignore.is_empty() {
                tracing::debug!("Adding {} patterns from .gitignore", gitignore.len());
                patterns.extend(gitignore);
            }
        }

        for extra in EXTRA_IGNORES {
            if !patterns.iter().any(|p| p == extra) {
                patterns.push((*extra).to_string());
            }
        }

        Ok(Self { patterns })
    }
}

/// Read the pattern lines of `<root>/.gitignore`
///
/// Blank lines and comments are dropped. A missing file yields no patterns.
pub fn read_gitignore(root: &Path) -> Result<Vec<String>> {
    let path = root.join(".gitignore");
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(".gitignore file not found, skipping");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(parse_gitignore(&content))
}

/// Parse gitignore content into pattern lines
pub fn parse_gitignore(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}
